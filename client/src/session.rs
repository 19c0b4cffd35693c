//! The operator's view of one draw and the guards on every phase change.
//!
//! A [`DrawSession`] is owned by whoever drives the draw and is handed to the
//! flow by `&mut`. Each `confirm_*` method is called only after the matching
//! remote call succeeded; a guard failure leaves the session untouched.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use prize_draw::constants::{MAX_PARTICIPANTS, MIN_PARTICIPANTS};
use solana_program::native_token::{lamports_to_sol, sol_to_lamports};
use solana_program::pubkey::Pubkey;
use tracing::{debug, info};

use crate::commitment::{Commitment, DrawSecret};
use crate::error::{DrawError, Result};
use crate::phase::DrawPhase;
use crate::store::SessionRecord;
use crate::winner::{select_winner, WinnerSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawConfig {
    pub prize_lamports: u64,
    pub participants_target: u32,
    pub winners_count: u32,
}

impl DrawConfig {
    /// Validates operator input. The prize is given in whole-asset units (SOL).
    pub fn new(prize: f64, participants_target: u32, winners_count: u32) -> Result<Self> {
        if !prize.is_finite() || prize <= 0.0 {
            return Err(DrawError::Validation(
                "enter a valid prize amount (SOL > 0)".into(),
            ));
        }
        Self::from_lamports(sol_to_lamports(prize), participants_target, winners_count)
    }

    pub fn from_lamports(
        prize_lamports: u64,
        participants_target: u32,
        winners_count: u32,
    ) -> Result<Self> {
        if prize_lamports == 0 {
            return Err(DrawError::Validation(
                "prize is smaller than one lamport".into(),
            ));
        }
        if participants_target < MIN_PARTICIPANTS {
            return Err(DrawError::Validation("enter at least 2 participants".into()));
        }
        if participants_target > MAX_PARTICIPANTS {
            return Err(DrawError::Validation(format!(
                "at most {} participants per draw",
                MAX_PARTICIPANTS
            )));
        }
        // A single index is derived per reveal; there is no rule for picking more.
        if winners_count != 1 {
            return Err(DrawError::Validation(format!(
                "only one winner per draw is supported, got {}",
                winners_count
            )));
        }
        Ok(Self {
            prize_lamports,
            participants_target,
            winners_count,
        })
    }

    pub fn prize_sol(&self) -> f64 {
        lamports_to_sol(self.prize_lamports)
    }
}

/// Parses and validates a participant address typed by the operator.
pub fn parse_address(text: &str) -> Result<Pubkey> {
    let trimmed = text.trim();
    Pubkey::from_str(trimmed).map_err(|_| DrawError::InvalidAddress(trimmed.to_string()))
}

/// `abcdef…wxyz` for log lines.
pub fn short_address(address: &Pubkey) -> String {
    let s = address.to_string();
    if s.len() <= 10 {
        return s;
    }
    format!("{}…{}", &s[..6], &s[s.len() - 4..])
}

/// Time-derived id in `1..=999_999`.
pub fn next_session_id() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    (secs % 999_999) as u32 + 1
}

#[derive(Debug, Clone)]
pub struct DrawSession {
    session_id: u32,
    phase: DrawPhase,
    config: Option<DrawConfig>,
    operator: Option<Pubkey>,
    secret: Option<DrawSecret>,
    commitment: Option<Commitment>,
    entrants: Vec<Pubkey>,
    registered: usize,
    winner: Option<WinnerSelection>,
    payout: Option<String>,
}

impl DrawSession {
    pub fn new(session_id: u32) -> Self {
        Self {
            session_id,
            phase: DrawPhase::Setup,
            config: None,
            operator: None,
            secret: None,
            commitment: None,
            entrants: Vec::new(),
            registered: 0,
            winner: None,
            payout: None,
        }
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    pub fn config(&self) -> Option<&DrawConfig> {
        self.config.as_ref()
    }

    pub fn operator(&self) -> Option<Pubkey> {
        self.operator
    }

    pub fn secret(&self) -> Option<&DrawSecret> {
        self.secret.as_ref()
    }

    pub fn commitment(&self) -> Option<&Commitment> {
        self.commitment.as_ref()
    }

    pub fn entrants(&self) -> &[Pubkey] {
        &self.entrants
    }

    /// Entrants confirmed on-chain, in registration order.
    pub fn registered(&self) -> &[Pubkey] {
        &self.entrants[..self.registered]
    }

    pub fn next_to_register(&self) -> Option<Pubkey> {
        self.entrants.get(self.registered).copied()
    }

    pub fn winner(&self) -> Option<&WinnerSelection> {
        self.winner.as_ref()
    }

    pub fn payout(&self) -> Option<&str> {
        self.payout.as_deref()
    }

    fn expect_phase(&self, expected: DrawPhase) -> Result<()> {
        if self.phase != expected {
            return Err(DrawError::Phase {
                expected,
                found: self.phase,
            });
        }
        Ok(())
    }

    fn advance(&mut self, to: DrawPhase) {
        debug_assert_eq!(self.phase.next(), Some(to));
        info!(session_id = self.session_id, from = %self.phase, to = %to, "phase change");
        self.phase = to;
    }

    fn target(&self) -> u32 {
        self.config.map(|c| c.participants_target).unwrap_or(0)
    }

    /// Sets the signing wallet. Once the commitment is out, only the
    /// authority recorded on-chain can drive the draw.
    pub fn connect_operator(&mut self, operator: Pubkey) -> Result<()> {
        if self.phase > DrawPhase::Idle {
            if let Some(current) = self.operator {
                if current != operator {
                    return Err(DrawError::Validation(format!(
                        "draw {} is owned by {}, reconnect that wallet",
                        self.session_id, current
                    )));
                }
            }
        }
        info!(operator = %operator, "wallet connected");
        self.operator = Some(operator);
        Ok(())
    }

    /// SETUP → IDLE. Local only.
    pub fn configure(&mut self, config: DrawConfig) -> Result<()> {
        self.expect_phase(DrawPhase::Setup)?;
        info!(
            session_id = self.session_id,
            prize_sol = config.prize_sol(),
            target = config.participants_target,
            "draw configured"
        );
        self.config = Some(config);
        self.entrants.clear();
        self.advance(DrawPhase::Idle);
        Ok(())
    }

    /// Adds an address to the local roster. No network call.
    pub fn enter_participant(&mut self, address: Pubkey) -> Result<()> {
        match self.phase {
            DrawPhase::Idle | DrawPhase::Open => {}
            DrawPhase::Setup => {
                return Err(DrawError::Phase {
                    expected: DrawPhase::Idle,
                    found: self.phase,
                })
            }
            DrawPhase::Closed | DrawPhase::Revealed => {
                return Err(DrawError::Phase {
                    expected: DrawPhase::Open,
                    found: self.phase,
                })
            }
        }
        if self.entrants.contains(&address) {
            return Err(DrawError::DuplicateParticipant(address.to_string()));
        }
        let target = self.target();
        if self.entrants.len() as u32 >= target {
            return Err(DrawError::RosterFull(target));
        }
        self.entrants.push(address);
        debug!(
            "added {} ({}/{})",
            short_address(&address),
            self.entrants.len(),
            target
        );
        Ok(())
    }

    /// Operator connected and setup confirmed. Before the commit every roster
    /// slot must be filled; afterwards the registered list is what counts.
    pub fn ready_to_draw(&self) -> Result<()> {
        if self.operator.is_none() {
            return Err(DrawError::NotReady("connect your wallet first".into()));
        }
        let target = match self.config {
            Some(config) => config.participants_target,
            None => return Err(DrawError::NotReady("complete the setup first".into())),
        };
        let entrants = self.entrants.len() as u32;
        match self.phase {
            DrawPhase::Setup => Err(DrawError::NotReady("complete the setup first".into())),
            DrawPhase::Idle if entrants < target => Err(DrawError::NotReady(format!(
                "add all {} participant wallets first",
                target
            ))),
            DrawPhase::Open if entrants < MIN_PARTICIPANTS => Err(DrawError::NotReady(format!(
                "add at least {} participant wallets first",
                MIN_PARTICIPANTS
            ))),
            _ => Ok(()),
        }
    }

    /// Holds `secret` for the coming commit. Refuses to replace a secret once
    /// its commitment may have been published.
    pub fn arm_secret(&mut self, secret: DrawSecret) -> Result<()> {
        self.expect_phase(DrawPhase::Idle)?;
        if self.commitment.is_some() {
            return Err(DrawError::Validation(format!(
                "draw {} already has a commitment armed",
                self.session_id
            )));
        }
        self.commitment = Some(secret.commitment());
        self.secret = Some(secret);
        Ok(())
    }

    /// Re-arms the secret from a recovery copy, checking it against the
    /// commitment this session already published.
    pub fn restore_secret(&mut self, record: &SessionRecord) -> Result<()> {
        if record.session_id != self.session_id {
            return Err(DrawError::Store(format!(
                "record belongs to session {}, not {}",
                record.session_id, self.session_id
            )));
        }
        let secret = record.secret()?;
        if secret.commitment() != record.commitment()? {
            return Err(DrawError::CommitmentMismatch);
        }
        if let Some(published) = &self.commitment {
            if &secret.commitment() != published {
                return Err(DrawError::CommitmentMismatch);
            }
        }
        self.commitment = Some(secret.commitment());
        self.secret = Some(secret);
        Ok(())
    }

    /// Snapshot for the recovery store. Needs the operator, the setup and
    /// the secret.
    pub fn record(&self) -> Result<SessionRecord> {
        let operator = self
            .operator
            .ok_or_else(|| DrawError::NotReady("connect your wallet first".into()))?;
        let config = self
            .config
            .ok_or_else(|| DrawError::NotReady("complete the setup first".into()))?;
        let secret = self
            .secret
            .as_ref()
            .ok_or(DrawError::MissingSecret(self.session_id))?;
        Ok(SessionRecord {
            session_id: self.session_id,
            phase: self.phase,
            secret_number: secret.secret_number().to_string(),
            salt: hex::encode(secret.salt()),
            commitment: hex::encode(secret.commitment()),
            operator: operator.to_string(),
            prize_lamports: config.prize_lamports,
            participants_target: config.participants_target,
            entrants: self.entrants.iter().map(|e| e.to_string()).collect(),
            registered: self.registered,
        })
    }

    /// Rebuilds a session from its recovery copy, at the phase last confirmed
    /// before the copy was written.
    pub fn resume(record: &SessionRecord) -> Result<Self> {
        if !matches!(
            record.phase,
            DrawPhase::Idle | DrawPhase::Open | DrawPhase::Closed
        ) {
            return Err(DrawError::Store(format!(
                "cannot resume a draw at {}",
                record.phase
            )));
        }
        let config = DrawConfig::from_lamports(
            record.prize_lamports,
            record.participants_target,
            1,
        )
        .map_err(|e| DrawError::Store(e.to_string()))?;
        let entrants = record.entrants()?;
        if entrants.len() as u32 > config.participants_target
            || record.registered > entrants.len()
        {
            return Err(DrawError::Store(format!(
                "roster of {} with {} registered does not fit a target of {}",
                entrants.len(),
                record.registered,
                config.participants_target
            )));
        }
        if record.phase == DrawPhase::Closed && record.registered != entrants.len() {
            return Err(DrawError::Store(
                "closed draw has unregistered entrants".into(),
            ));
        }

        let mut session = Self::new(record.session_id);
        session.operator = Some(record.operator()?);
        session.config = Some(config);
        session.entrants = entrants;
        session.registered = record.registered;
        session.restore_secret(record)?;
        session.phase = record.phase;
        info!(
            session_id = session.session_id,
            phase = %session.phase,
            registered = session.registered,
            "session resumed"
        );
        Ok(session)
    }

    /// Drops the in-memory secret. The next reveal attempt has to come back
    /// through [`DrawSession::restore_secret`].
    pub fn forget_secret(&mut self) {
        self.secret = None;
    }

    /// IDLE → OPEN, after `commit_draw` succeeded.
    pub fn confirm_commit(&mut self) -> Result<()> {
        self.expect_phase(DrawPhase::Idle)?;
        if self.commitment.is_none() {
            return Err(DrawError::MissingSecret(self.session_id));
        }
        self.advance(DrawPhase::Open);
        Ok(())
    }

    /// OPEN → OPEN, after `register_participant(address)` succeeded.
    pub fn confirm_registration(&mut self, address: Pubkey) -> Result<()> {
        self.expect_phase(DrawPhase::Open)?;
        let target = self.target();
        if self.registered as u32 >= target {
            return Err(DrawError::RosterFull(target));
        }
        if self.registered().contains(&address) {
            return Err(DrawError::DuplicateParticipant(address.to_string()));
        }
        if self.next_to_register() != Some(address) {
            return Err(DrawError::Validation(format!(
                "{} is not the next entrant to register",
                address
            )));
        }
        self.registered += 1;
        info!(
            session_id = self.session_id,
            "registered {} ({}/{})",
            short_address(&address),
            self.registered,
            target
        );
        Ok(())
    }

    /// OPEN → CLOSED, after `close_registrations` succeeded. Entrants that
    /// were never registered are dropped from the frozen list.
    pub fn confirm_close(&mut self) -> Result<()> {
        self.expect_phase(DrawPhase::Open)?;
        let count = self.registered as u32;
        if count < MIN_PARTICIPANTS {
            return Err(DrawError::NotEnoughParticipants(count));
        }
        self.entrants.truncate(self.registered);
        self.advance(DrawPhase::Closed);
        Ok(())
    }

    /// Winner the reveal will produce. Needs a closed draw.
    pub fn preview_winner(&self, secret: &DrawSecret) -> Result<WinnerSelection> {
        self.expect_phase(DrawPhase::Closed)?;
        if self.commitment.as_ref() != Some(&secret.commitment()) {
            return Err(DrawError::CommitmentMismatch);
        }
        select_winner(secret.secret_number(), self.registered())
    }

    /// CLOSED → REVEALED, after `reveal_winner` succeeded. The secret is
    /// dropped from memory.
    pub fn confirm_reveal(&mut self, secret: &DrawSecret) -> Result<WinnerSelection> {
        let selection = self.preview_winner(secret)?;
        self.winner = Some(selection);
        self.secret = None;
        self.advance(DrawPhase::Revealed);
        info!(
            session_id = self.session_id,
            winner_index = selection.index,
            winner = %selection.address,
            "winner revealed"
        );
        Ok(selection)
    }

    /// Records the prize transfer. Once only, after the reveal.
    pub fn record_payout(&mut self, signature: String) -> Result<()> {
        self.expect_phase(DrawPhase::Revealed)?;
        if let Some(existing) = &self.payout {
            return Err(DrawError::Validation(format!(
                "prize already paid in {}",
                existing
            )));
        }
        self.payout = Some(signature);
        Ok(())
    }
}
