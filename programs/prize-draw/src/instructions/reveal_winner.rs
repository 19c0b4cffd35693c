use anchor_lang::prelude::*;

use crate::constants::SEED_DRAW;
use crate::error::DrawError;
use crate::events::WinnerRevealed;
use crate::state::{winner_index, DrawPhase, DrawSession, Entry};

/// Accounts required to reveal the winner.
///
/// This ensures that:
/// 1. Only the draw authority can reveal.
/// 2. Registrations are closed.
/// 3. The winner entry belongs to this draw.
#[derive(Accounts)]
pub struct RevealWinner<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_DRAW, draw.session_id.to_le_bytes().as_ref()],
        bump = draw.bump,
        has_one = authority @ DrawError::NotAuthorized,
    )]
    pub draw: Account<'info, DrawSession>,

    /// The entry the caller claims is at `secret_number % num_participants`.
    /// Its index is checked against the computed winner in the handler.
    #[account(constraint = winner_entry.draw == draw.key() @ DrawError::EntryDrawMismatch)]
    pub winner_entry: Account<'info, Entry>,
}

/// Reveals the secret. The program recomputes the commitment, derives the
/// winner index and records the winner.
///
/// # Arguments
/// * `ctx` - Context holding the RevealWinner accounts
/// * `secret_number` - The secret committed to, never zero
/// * `salt` - The 32-byte salt committed to
pub fn process_reveal_winner(
    ctx: Context<RevealWinner>,
    secret_number: u64,
    salt: [u8; 32],
) -> Result<()> {
    let draw = &mut ctx.accounts.draw;

    require!(
        draw.phase == DrawPhase::Closed,
        DrawError::RegistrationsNotClosed
    );
    require!(secret_number != 0, DrawError::ZeroSecret);

    if !draw.matches_commitment(secret_number, &salt) {
        msg!("Commitment mismatch for draw {}", draw.session_id);
        return Err(DrawError::CommitmentMismatch.into());
    }

    let index = winner_index(secret_number, draw.num_participants);
    msg!(
        "Winner index: {} ({} % {})",
        index,
        secret_number,
        draw.num_participants
    );

    let winner_entry = &ctx.accounts.winner_entry;
    require!(
        winner_entry.index == index,
        DrawError::WinnerEntryMismatch
    );

    draw.phase = DrawPhase::Revealed;
    draw.winner_index = index;
    draw.winner = winner_entry.participant;
    draw.revealed_secret = secret_number;
    draw.revealed_salt = salt;

    emit!(WinnerRevealed {
        draw: draw.key(),
        winner_index: index,
        winner: winner_entry.participant,
        secret_number,
        num_participants: draw.num_participants,
    });

    Ok(())
}
