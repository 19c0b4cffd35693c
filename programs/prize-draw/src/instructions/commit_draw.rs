use anchor_lang::prelude::*;

use crate::constants::SEED_DRAW;
use crate::events::DrawCommitted;
use crate::state::{DrawPhase, DrawSession};

/// Accounts required to commit a new draw.
///
/// Ensures:
/// 1. The authority signs and pays for the draw account.
/// 2. A draw with the same session id does not already exist.
#[derive(Accounts)]
#[instruction(session_id: u32)]
pub struct CommitDraw<'info> {
    /// The operator publishing the commitment.
    #[account(mut)]
    pub authority: Signer<'info>,

    /// The draw state account, one per session id.
    #[account(
        init,
        payer = authority,
        space = 8 + DrawSession::INIT_SPACE,
        seeds = [SEED_DRAW, session_id.to_le_bytes().as_ref()],
        bump
    )]
    pub draw: Account<'info, DrawSession>,

    pub system_program: Program<'info, System>,
}

/// Publishes `commitment = SHA-256(secret_be8 || salt)` before any participant
/// is known. The commitment cannot be changed afterwards.
///
/// # Arguments
/// * `ctx` - Context holding the CommitDraw accounts
/// * `session_id` - Identifier chosen by the authority
/// * `commitment` - Hash commitment over the secret number and salt
pub fn process_commit_draw(
    ctx: Context<CommitDraw>,
    session_id: u32,
    commitment: [u8; 32],
) -> Result<()> {
    let draw = &mut ctx.accounts.draw;
    draw.bump = ctx.bumps.draw;
    draw.session_id = session_id;
    draw.authority = ctx.accounts.authority.key();
    draw.commitment = commitment;
    draw.num_participants = 0;
    draw.phase = DrawPhase::Open;
    draw.winner_index = 0;
    draw.winner = Pubkey::default();
    draw.revealed_secret = 0;
    draw.revealed_salt = [0; 32];

    msg!("Draw {} committed", session_id);

    emit!(DrawCommitted {
        draw: draw.key(),
        session_id,
        commitment,
    });

    Ok(())
}
