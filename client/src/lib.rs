//! Operator-side client for commit-reveal prize draws.
//!
//! The operator commits to a hidden number, registers the entrants, closes
//! the roster and reveals. Anyone can recompute the winner index as
//! `secret mod participant_count` from the revealed values.

/// Wallet and RPC traits plus the simulate, sign, submit and poll path.
pub mod chain;

/// Secrets and their SHA-256 commitments.
pub mod commitment;

pub mod config;

/// Instruction builders for the on-chain draw program.
pub mod contract;

pub mod error;

/// Orchestration of a whole draw, resumable after a failed step.
pub mod flow;

pub mod phase;

/// Simulated proof artifacts.
pub mod proof;

/// Local draw state and its phase guards.
pub mod session;

/// Persisted session records, including the recovery copy of the secret.
pub mod store;

pub mod winner;

#[cfg(test)]
mod mock;

pub use chain::{
    MemcmpFilter, PreparedTransaction, Rpc, SignedTransaction, Submitter, TxReceipt, TxStatus,
    Wallet,
};
pub use commitment::{verify_commitment, Commitment, DrawSecret};
pub use config::ClientConfig;
pub use contract::DrawProgram;
pub use error::{DrawError, Result};
pub use flow::{DrawFlow, DrawOutcome};
pub use phase::DrawPhase;
pub use proof::{ProofArtifact, ProofBackend, SimulatedProofBackend};
pub use session::{DrawConfig, DrawSession};
pub use store::{FileSessionStore, MemorySessionStore, SessionRecord, SessionStore};
pub use winner::{select_winner, verify_draw, WinnerSelection};
