#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;
use instructions::*;

/// Seeds, participant bounds and byte lengths shared with off-chain clients.
pub mod constants;

/// Custom error types returned via the Anchor framework when instructions fail.
pub mod error;

/// Events emitted at each phase change of a draw.
pub mod events;

/// Instruction handlers: commit, register, close and reveal.
pub mod instructions;

/// On-chain draw state plus the commitment and winner-index functions
/// that clients must reproduce bit for bit.
pub mod state;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[program]
pub mod prize_draw {
    use super::*;

    pub fn commit_draw(
        ctx: Context<CommitDraw>,
        session_id: u32,
        commitment: [u8; 32],
    ) -> Result<()> {
        process_commit_draw(ctx, session_id, commitment)
    }

    pub fn register_participant(
        ctx: Context<RegisterParticipant>,
        participant: Pubkey,
    ) -> Result<()> {
        process_register_participant(ctx, participant)
    }

    pub fn close_registrations(ctx: Context<CloseRegistrations>) -> Result<()> {
        process_close_registrations(ctx)
    }

    pub fn reveal_winner(
        ctx: Context<RevealWinner>,
        secret_number: u64,
        salt: [u8; 32],
    ) -> Result<()> {
        process_reveal_winner(ctx, secret_number, salt)
    }
}
