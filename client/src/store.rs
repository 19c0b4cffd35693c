use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use tracing::debug;

use crate::commitment::{decode_32, Commitment, DrawSecret};
use crate::error::{DrawError, Result};
use crate::phase::DrawPhase;

/// Recovery copy of a session, rewritten after every confirmed step and
/// removed once the reveal is confirmed. Enough to rebuild the session with
/// [`DrawSession::resume`](crate::session::DrawSession::resume).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: u32,
    /// Last phase confirmed on-chain.
    pub phase: DrawPhase,
    /// Decimal text of the u64.
    pub secret_number: String,
    pub salt: String,
    pub commitment: String,
    /// Base58 address that signed the commit.
    pub operator: String,
    pub prize_lamports: u64,
    pub participants_target: u32,
    /// Roster in registration order.
    pub entrants: Vec<String>,
    /// How many of `entrants` are registered on-chain.
    pub registered: usize,
}

impl SessionRecord {
    pub fn secret(&self) -> Result<DrawSecret> {
        let secret_number = self
            .secret_number
            .parse::<u64>()
            .map_err(|e| DrawError::Store(format!("secret_number: {}", e)))?;
        let salt = decode_32("salt", &self.salt)?;
        DrawSecret::from_parts(secret_number, salt)
    }

    pub fn commitment(&self) -> Result<Commitment> {
        decode_32("commitment", &self.commitment)
    }

    pub fn operator(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.operator)
            .map_err(|e| DrawError::Store(format!("operator: {}", e)))
    }

    pub fn entrants(&self) -> Result<Vec<Pubkey>> {
        self.entrants
            .iter()
            .map(|s| Pubkey::from_str(s).map_err(|e| DrawError::Store(format!("entrant {}: {}", s, e))))
            .collect()
    }
}

/// Session-keyed storage for the recovery copy.
pub trait SessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()>;
    fn load(&self, session_id: u32) -> Result<Option<SessionRecord>>;
    fn clear(&self, session_id: u32) -> Result<()>;
}

/// One pretty-printed JSON file per session under `dir`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: u32) -> PathBuf {
        self.dir.join(format!("draw_{}.json", session_id))
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(record.session_id);
        std::fs::write(&path, serde_json::to_string_pretty(record)?)?;
        debug!(
            session_id = record.session_id,
            phase = %record.phase,
            path = %path.display(),
            "saved recovery copy"
        );
        Ok(())
    }

    fn load(&self, session_id: u32) -> Result<Option<SessionRecord>> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let s = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&s)?))
    }

    fn clear(&self, session_id: u32) -> Result<()> {
        let path = self.path_for(session_id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(session_id, "cleared recovery copy");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<u32, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<u32, SessionRecord>>> {
        self.records
            .lock()
            .map_err(|_| DrawError::Store("session store lock poisoned".into()))
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        self.records()?.insert(record.session_id, record.clone());
        Ok(())
    }

    fn load(&self, session_id: u32) -> Result<Option<SessionRecord>> {
        Ok(self.records()?.get(&session_id).cloned())
    }

    fn clear(&self, session_id: u32) -> Result<()> {
        self.records()?.remove(&session_id);
        Ok(())
    }
}
