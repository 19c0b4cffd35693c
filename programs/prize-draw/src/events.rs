use anchor_lang::prelude::*;

#[event]
pub struct DrawCommitted {
    pub draw: Pubkey,
    pub session_id: u32,
    pub commitment: [u8; 32],
}

#[event]
pub struct ParticipantRegistered {
    pub draw: Pubkey,
    pub participant: Pubkey,
    pub num_participants: u32,
}

#[event]
pub struct RegistrationsClosed {
    pub draw: Pubkey,
    pub num_participants: u32,
}

#[event]
pub struct WinnerRevealed {
    pub draw: Pubkey,
    pub winner_index: u32,
    pub winner: Pubkey,
    pub secret_number: u64,
    pub num_participants: u32,
}
