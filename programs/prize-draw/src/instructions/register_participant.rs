use anchor_lang::prelude::*;

use crate::constants::{MAX_PARTICIPANTS, SEED_DRAW, SEED_ENTRY};
use crate::error::DrawError;
use crate::events::ParticipantRegistered;
use crate::state::{DrawPhase, DrawSession, Entry};

/// Accounts required to register a participant.
///
/// The entry PDA is seeded by the participant address, so a second
/// registration of the same address fails when the account is created.
#[derive(Accounts)]
#[instruction(participant: Pubkey)]
pub struct RegisterParticipant<'info> {
    /// The draw authority, paying for the entry account.
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_DRAW, draw.session_id.to_le_bytes().as_ref()],
        bump = draw.bump,
        has_one = authority @ DrawError::NotAuthorized,
    )]
    pub draw: Account<'info, DrawSession>,

    #[account(
        init,
        payer = authority,
        space = 8 + Entry::INIT_SPACE,
        seeds = [SEED_ENTRY, draw.key().as_ref(), participant.as_ref()],
        bump
    )]
    pub entry: Account<'info, Entry>,

    pub system_program: Program<'info, System>,
}

/// Appends `participant` to the draw in registration order.
///
/// # Arguments
/// * `ctx` - Context holding the RegisterParticipant accounts
/// * `participant` - Address entering the draw
pub fn process_register_participant(
    ctx: Context<RegisterParticipant>,
    participant: Pubkey,
) -> Result<()> {
    let draw = &mut ctx.accounts.draw;

    require!(draw.phase == DrawPhase::Open, DrawError::RegistrationClosed);
    require!(
        draw.num_participants < MAX_PARTICIPANTS,
        DrawError::MaxParticipantsReached
    );

    let entry = &mut ctx.accounts.entry;
    entry.bump = ctx.bumps.entry;
    entry.draw = draw.key();
    entry.participant = participant;
    entry.index = draw.num_participants;

    draw.num_participants += 1;

    msg!("Registered {} as #{}", participant, entry.index);

    emit!(ParticipantRegistered {
        draw: draw.key(),
        participant,
        num_participants: draw.num_participants,
    });

    Ok(())
}
