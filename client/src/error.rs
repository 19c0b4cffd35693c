use crate::phase::DrawPhase;

pub type Result<T> = std::result::Result<T, DrawError>;

/// Everything that can stop a draw step.
///
/// Remote failures (`WalletDenied` through `ConfirmationTimeout`) abort the
/// running flow and leave the session in its last confirmed phase. The rest
/// are local guard failures raised before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// The wallet refused access or refused to sign.
    WalletDenied(String),
    /// Transaction simulation was rejected by the RPC node.
    Simulation(String),
    /// The RPC node refused the signed transaction.
    Submission(String),
    /// The transaction landed but failed during execution.
    OnChain(String),
    /// The transaction did not reach finality within the polling budget.
    ConfirmationTimeout { signature: String, attempts: u32 },
    InvalidAddress(String),
    InvalidConfig(String),
    Validation(String),
    Phase { expected: DrawPhase, found: DrawPhase },
    DuplicateParticipant(String),
    RosterFull(u32),
    NotEnoughParticipants(u32),
    MissingSecret(u32),
    CommitmentMismatch,
    AlreadyRunning,
    NotReady(String),
    Store(String),
    Proof(String),
    /// On-chain account data is missing, undecodable or inconsistent.
    Account(String),
}

impl std::fmt::Display for DrawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WalletDenied(msg) => write!(f, "wallet error: {}", msg),
            Self::Simulation(msg) => write!(f, "simulation: {}", msg),
            Self::Submission(msg) => write!(f, "submit: {}", msg),
            Self::OnChain(msg) => write!(f, "transaction failed on-chain: {}", msg),
            Self::ConfirmationTimeout { signature, attempts } => write!(
                f,
                "timeout waiting for confirmation of {} after {} attempts",
                signature, attempts
            ),
            Self::InvalidAddress(addr) => write!(f, "invalid address: {}", addr),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            Self::Validation(msg) => write!(f, "{}", msg),
            Self::Phase { expected, found } => {
                write!(f, "draw is {} but this step needs {}", found, expected)
            }
            Self::DuplicateParticipant(addr) => write!(f, "address already added: {}", addr),
            Self::RosterFull(target) => write!(f, "participant limit reached ({})", target),
            Self::NotEnoughParticipants(count) => {
                write!(f, "need at least 2 participants, have {}", count)
            }
            Self::MissingSecret(session_id) => {
                write!(f, "no secret held or stored for session {}", session_id)
            }
            Self::CommitmentMismatch => write!(f, "secret does not match the commitment"),
            Self::AlreadyRunning => write!(f, "a draw is already running"),
            Self::NotReady(msg) => write!(f, "draw not ready: {}", msg),
            Self::Store(msg) => write!(f, "session store: {}", msg),
            Self::Proof(msg) => write!(f, "proof backend: {}", msg),
            Self::Account(msg) => write!(f, "account data: {}", msg),
        }
    }
}

impl std::error::Error for DrawError {}

impl From<std::io::Error> for DrawError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for DrawError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_step() {
        assert_eq!(
            DrawError::Simulation("bad account".into()).to_string(),
            "simulation: bad account"
        );
        assert_eq!(
            DrawError::Phase {
                expected: DrawPhase::Open,
                found: DrawPhase::Idle
            }
            .to_string(),
            "draw is IDLE but this step needs OPEN"
        );
        assert_eq!(
            DrawError::ConfirmationTimeout {
                signature: "5xyz".into(),
                attempts: 30
            }
            .to_string(),
            "timeout waiting for confirmation of 5xyz after 30 attempts"
        );
    }
}
