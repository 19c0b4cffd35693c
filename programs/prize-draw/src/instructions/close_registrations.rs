use anchor_lang::prelude::*;

use crate::constants::SEED_DRAW;
use crate::error::DrawError;
use crate::events::RegistrationsClosed;
use crate::state::{DrawPhase, DrawSession};

#[derive(Accounts)]
pub struct CloseRegistrations<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_DRAW, draw.session_id.to_le_bytes().as_ref()],
        bump = draw.bump,
        has_one = authority @ DrawError::NotAuthorized,
    )]
    pub draw: Account<'info, DrawSession>,
}

/// Freezes the participant list. `num_participants` is fixed from here on
/// and is the modulus used at reveal.
pub fn process_close_registrations(ctx: Context<CloseRegistrations>) -> Result<()> {
    let draw = &mut ctx.accounts.draw;

    require!(draw.phase == DrawPhase::Open, DrawError::SessionNotOpen);
    require!(draw.can_close(), DrawError::NotEnoughParticipants);

    draw.phase = DrawPhase::Closed;

    msg!(
        "Draw {} closed with {} participants",
        draw.session_id,
        draw.num_participants
    );

    emit!(RegistrationsClosed {
        draw: draw.key(),
        num_participants: draw.num_participants,
    });

    Ok(())
}
