use anchor_lang::prelude::*;
use solana_program::hash::hashv;

use crate::constants::{COMMITMENT_LEN, MIN_PARTICIPANTS, SALT_LEN};

/// Phase of an on-chain draw. A draw account only exists once committed,
/// so there is no pre-commit variant here.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum DrawPhase {
    /// Accepting registrations.
    Open,
    /// Registration frozen, waiting for the reveal.
    Closed,
    /// Winner revealed.
    Revealed,
}

#[account]
#[derive(InitSpace)]
pub struct DrawSession {
    /// The bump seed used for deriving the PDA address of this account.
    pub bump: u8,

    /// Identifier chosen by the authority at commit time.
    pub session_id: u32,

    /// The operator who committed the draw and is the only one allowed
    /// to register, close and reveal.
    pub authority: Pubkey,

    /// SHA-256(secret_number_be8 || salt32), published before any registration.
    pub commitment: [u8; 32],

    /// Number of registered participants. Frozen once the draw is closed.
    pub num_participants: u32,

    pub phase: DrawPhase,

    /// Index of the winning entry. Only meaningful once `phase == Revealed`.
    pub winner_index: u32,

    /// Address of the winning participant. Default until revealed.
    pub winner: Pubkey,

    /// The revealed secret and salt, kept so anyone can recompute the
    /// commitment and the winner index from account data alone.
    pub revealed_secret: u64,
    pub revealed_salt: [u8; 32],
}

impl DrawSession {
    pub fn can_close(&self) -> bool {
        self.phase == DrawPhase::Open && self.num_participants >= MIN_PARTICIPANTS
    }

    pub fn matches_commitment(&self, secret_number: u64, salt: &[u8; SALT_LEN]) -> bool {
        compute_commitment(secret_number, salt) == self.commitment
    }
}

/// One registration. The PDA is derived from the draw and the participant,
/// so registering the same address twice fails at account creation.
#[account]
#[derive(InitSpace)]
pub struct Entry {
    pub bump: u8,
    pub draw: Pubkey,
    pub participant: Pubkey,
    /// Position in registration order, starting at 0.
    pub index: u32,
}

/// Hash commitment over the big-endian secret followed by the salt.
pub fn compute_commitment(secret_number: u64, salt: &[u8; SALT_LEN]) -> [u8; COMMITMENT_LEN] {
    hashv(&[&secret_number.to_be_bytes()[..], &salt[..]]).to_bytes()
}

/// `secret_number mod num_participants`. Callers guarantee `num_participants >= 2`.
pub fn winner_index(secret_number: u64, num_participants: u32) -> u32 {
    (secret_number % num_participants as u64) as u32
}
