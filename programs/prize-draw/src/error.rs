use anchor_lang::prelude::*;

#[error_code]
pub enum DrawError {
    #[msg("Only the draw authority can do this")]
    NotAuthorized,
    #[msg("Registration is closed")]
    RegistrationClosed,
    #[msg("Max participants reached")]
    MaxParticipantsReached,
    #[msg("Session is not open")]
    SessionNotOpen,
    #[msg("Need at least 2 participants")]
    NotEnoughParticipants,
    #[msg("Must close registrations before reveal")]
    RegistrationsNotClosed,
    #[msg("Secret number must be > 0")]
    ZeroSecret,
    #[msg("Commitment mismatch: reveal is invalid")]
    CommitmentMismatch,
    #[msg("Winner entry does not match the computed winner index")]
    WinnerEntryMismatch,
    #[msg("Entry does not belong to this draw")]
    EntryDrawMismatch,
}
