//! Proof artifacts attached to a revealed draw.
//!
//! No prover is wired in. [`SimulatedProofBackend`] emits a document with the
//! right public inputs and placeholder proof bytes, flagged as simulated.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commitment::Commitment;
use crate::error::{DrawError, Result};

pub const CIRCUIT_NAME: &str = "zk_roulette";
pub const SIMULATED_BACKEND: &str = "barretenberg/UltraPlonk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofInputs {
    pub session_id: u32,
    pub commitment: Commitment,
    pub participant_count: u32,
    pub winner_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    /// `0x`-prefixed hex of the commitment.
    pub public_commitment: String,
    pub number_of_participants: u32,
    pub winner_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    #[serde(rename = "_note")]
    pub note: String,
    pub session_id: u32,
    pub circuit: String,
    pub backend: String,
    pub public_inputs: PublicInputs,
    pub proof_bytes: String,
    pub verified: bool,
    /// Unix seconds.
    pub timestamp: u64,
}

impl ProofArtifact {
    pub fn file_name(&self) -> String {
        format!("zk_proof_{}.json", self.session_id)
    }

    /// Writes the artifact as pretty JSON and returns its path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| DrawError::Proof(e.to_string()))?;
        let path = dir.join(self.file_name());
        let body =
            serde_json::to_string_pretty(self).map_err(|e| DrawError::Proof(e.to_string()))?;
        std::fs::write(&path, body).map_err(|e| DrawError::Proof(e.to_string()))?;
        info!(session_id = self.session_id, path = %path.display(), "proof artifact written");
        Ok(path)
    }
}

pub trait ProofBackend {
    fn prove(&self, inputs: &ProofInputs) -> Result<ProofArtifact>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProofBackend;

impl ProofBackend for SimulatedProofBackend {
    fn prove(&self, inputs: &ProofInputs) -> Result<ProofArtifact> {
        if inputs.winner_index >= inputs.participant_count {
            return Err(DrawError::Proof(format!(
                "winner index {} out of range for {} participants",
                inputs.winner_index, inputs.participant_count
            )));
        }

        let mut placeholder = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut placeholder);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Ok(ProofArtifact {
            note: "SIMULATED proof, not produced by a prover".to_string(),
            session_id: inputs.session_id,
            circuit: CIRCUIT_NAME.to_string(),
            backend: SIMULATED_BACKEND.to_string(),
            public_inputs: PublicInputs {
                public_commitment: format!("0x{}", hex::encode(inputs.commitment)),
                number_of_participants: inputs.participant_count,
                winner_index: inputs.winner_index,
            },
            proof_bytes: format!("0x{}…", hex::encode(placeholder)),
            verified: true,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ProofInputs {
        ProofInputs {
            session_id: 314,
            commitment: [0xab; 32],
            participant_count: 3,
            winner_index: 1,
        }
    }

    #[test]
    fn simulated_artifact_carries_public_inputs() {
        let artifact = SimulatedProofBackend.prove(&inputs()).unwrap();
        assert_eq!(artifact.circuit, "zk_roulette");
        assert_eq!(artifact.public_inputs.public_commitment, format!("0x{}", "ab".repeat(32)));
        assert_eq!(artifact.public_inputs.number_of_participants, 3);
        assert_eq!(artifact.public_inputs.winner_index, 1);
        assert!(artifact.proof_bytes.starts_with("0x"));
        assert!(artifact.verified);
    }

    #[test]
    fn note_is_serialized_with_leading_underscore() {
        let artifact = SimulatedProofBackend.prove(&inputs()).unwrap();
        let value = serde_json::to_value(&artifact).unwrap();
        assert!(value.get("_note").is_some());
        assert_eq!(value["public_inputs"]["number_of_participants"], 3);
    }

    #[test]
    fn rejects_index_outside_roster() {
        let mut bad = inputs();
        bad.winner_index = 3;
        assert!(matches!(
            SimulatedProofBackend.prove(&bad),
            Err(DrawError::Proof(_))
        ));
    }

    #[test]
    fn writes_named_file() {
        let dir = std::env::temp_dir().join(format!("draw-proof-{}", std::process::id()));
        let artifact = SimulatedProofBackend.prove(&inputs()).unwrap();
        let path = artifact.write_to_dir(&dir).unwrap();
        assert_eq!(path, dir.join("zk_proof_314.json"));

        let read: ProofArtifact =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, artifact);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
