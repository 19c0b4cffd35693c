use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::error::{DrawError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base58 id of the deployed draw program.
    pub program_id: String,
    /// Network name handed to the wallet with every signature request.
    pub network: String,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    /// Where recovery copies of draw secrets are kept.
    pub session_dir: PathBuf,
    /// Where proof artifacts are written.
    pub proof_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: prize_draw::ID.to_string(),
            network: "devnet".to_string(),
            poll_interval_ms: 2_000,
            max_polls: 30,
            session_dir: PathBuf::from("./.draw-sessions"),
            proof_dir: PathBuf::from("./proofs"),
        }
    }
}

impl ClientConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DrawError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&s)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| DrawError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.program_id()?;
        if self.max_polls == 0 {
            return Err(DrawError::InvalidConfig("max_polls must be > 0".into()));
        }
        if self.network.is_empty() {
            return Err(DrawError::InvalidConfig("network must be set".into()));
        }
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.program_id)
            .map_err(|e| DrawError::InvalidConfig(format!("program_id: {}", e)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_confirmation_budget() {
        let config = ClientConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.max_polls, 30);
        assert_eq!(config.program_id().unwrap(), prize_draw::ID);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = ClientConfig::from_json_str(r#"{ "network": "mainnet-beta", "max_polls": 5 }"#)
            .unwrap();
        assert_eq!(config.network, "mainnet-beta");
        assert_eq!(config.max_polls, 5);
        assert_eq!(config.poll_interval_ms, 2_000);
    }

    #[test]
    fn rejects_bad_program_id() {
        let err = ClientConfig::from_json_str(r#"{ "program_id": "not-a-key" }"#).unwrap_err();
        assert!(matches!(err, DrawError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_polls() {
        assert!(ClientConfig::from_json_str(r#"{ "max_polls": 0 }"#).is_err());
    }
}
