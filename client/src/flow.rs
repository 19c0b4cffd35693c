//! Drives a configured draw from commit to payout.
//!
//! Each step is one transaction, submitted and confirmed before the session
//! moves on. A failed step stops the run and leaves the session in its last
//! confirmed phase, so calling [`DrawFlow::run`] again picks up from there.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use prize_draw::state::DrawPhase as ChainPhase;
use solana_program::pubkey::Pubkey;
use tracing::{info, warn};

use crate::chain::{Rpc, Submitter, Wallet};
use crate::commitment::{short_hex, DrawSecret};
use crate::config::ClientConfig;
use crate::contract::{prize_payment, DrawProgram};
use crate::error::{DrawError, Result};
use crate::phase::DrawPhase;
use crate::proof::{ProofBackend, ProofInputs};
use crate::session::{short_address, DrawSession};
use crate::store::SessionStore;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub session_id: u32,
    pub winner_index: u32,
    pub winner: Pubkey,
    pub prize_lamports: u64,
    pub payout_signature: String,
    /// Set when this run produced the proof artifact.
    pub proof_path: Option<PathBuf>,
}

struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DrawError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DrawFlow<W, R, S, P> {
    submitter: Submitter<W, R>,
    program: DrawProgram,
    store: S,
    prover: P,
    proof_dir: PathBuf,
    running: AtomicBool,
}

impl<W, R, S, P> DrawFlow<W, R, S, P>
where
    W: Wallet,
    R: Rpc,
    S: SessionStore,
    P: ProofBackend,
{
    pub fn new(wallet: W, rpc: R, store: S, prover: P, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            submitter: Submitter::new(wallet, rpc, config),
            program: DrawProgram::new(config.program_id()?),
            store,
            prover,
            proof_dir: config.proof_dir.clone(),
            running: AtomicBool::new(false),
        })
    }

    pub fn submitter(&self) -> &Submitter<W, R> {
        &self.submitter
    }

    pub fn program(&self) -> &DrawProgram {
        &self.program
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn connect_wallet(&self, session: &mut DrawSession) -> Result<Pubkey> {
        let operator = self.submitter.wallet().request_access().await?;
        session.connect_operator(operator)?;
        Ok(operator)
    }

    /// Runs the remaining steps of `session`. Only one run at a time per flow.
    pub async fn run(&self, session: &mut DrawSession) -> Result<DrawOutcome> {
        let _guard = RunGuard::acquire(&self.running)?;
        session.ready_to_draw()?;

        match self.drive(session).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(
                    session_id = session.session_id(),
                    phase = %session.phase(),
                    error = %e,
                    "draw stopped"
                );
                Err(e)
            }
        }
    }

    async fn drive(&self, session: &mut DrawSession) -> Result<DrawOutcome> {
        let operator = session
            .operator()
            .ok_or_else(|| DrawError::NotReady("connect your wallet first".into()))?;
        let mut proof_path = None;

        if session.phase() < DrawPhase::Revealed {
            self.reconcile(session).await?;
        }
        if session.phase() == DrawPhase::Idle {
            self.commit(session, &operator).await?;
        }
        if session.phase() == DrawPhase::Open {
            self.register_and_close(session, &operator).await?;
        }
        if session.phase() == DrawPhase::Closed {
            proof_path = Some(self.reveal(session, &operator).await?);
        }
        let payout_signature = self.pay(session, &operator).await?;

        let winner = session
            .winner()
            .copied()
            .ok_or(DrawError::Phase {
                expected: DrawPhase::Revealed,
                found: session.phase(),
            })?;
        let prize_lamports = session.config().map(|c| c.prize_lamports).unwrap_or_default();
        Ok(DrawOutcome {
            session_id: session.session_id(),
            winner_index: winner.index,
            winner: winner.address,
            prize_lamports,
            payout_signature,
            proof_path,
        })
    }

    /// Applies steps that landed on-chain but were never confirmed here, such
    /// as a transaction that outlived the polling budget.
    async fn reconcile(&self, session: &mut DrawSession) -> Result<()> {
        let session_id = session.session_id();
        let rpc = self.submitter.rpc();
        let Some(draw) = self.program.fetch_draw(rpc, session_id).await? else {
            return Ok(());
        };
        let before = session.phase();

        if session.phase() == DrawPhase::Idle {
            match session.commitment().copied() {
                None => {
                    return Err(DrawError::Validation(format!(
                        "draw {} already exists on-chain",
                        session_id
                    )))
                }
                Some(commitment) if commitment != draw.commitment => {
                    return Err(DrawError::CommitmentMismatch)
                }
                Some(_) => session.confirm_commit()?,
            }
        }

        if session.phase() == DrawPhase::Open {
            let confirmed = session.registered().len();
            if (confirmed as u32) < draw.num_participants {
                let on_chain = self.program.fetch_participants(rpc, session_id).await?;
                for participant in on_chain.iter().skip(confirmed) {
                    session.confirm_registration(*participant)?;
                }
            }
            if draw.phase != ChainPhase::Open {
                session.confirm_close()?;
            }
        }

        if session.phase() == DrawPhase::Closed && draw.phase == ChainPhase::Revealed {
            let secret = self.ensure_secret(session)?;
            let selection = session.preview_winner(&secret)?;
            if selection.index != draw.winner_index || selection.address != draw.winner {
                return Err(DrawError::Account(format!(
                    "draw {} revealed winner #{}, expected #{}",
                    session_id, draw.winner_index, selection.index
                )));
            }
            session.confirm_reveal(&secret)?;
            self.clear_recovery_copy(session_id);
        } else if session.phase() != before {
            self.ensure_secret(session)?;
            self.checkpoint(session)?;
        }

        if session.phase() != before {
            info!(session_id, from = %before, to = %session.phase(), "caught up with chain");
        }
        Ok(())
    }

    /// IDLE → OPEN. The recovery copy is stored before the commitment leaves.
    async fn commit(&self, session: &mut DrawSession, operator: &Pubkey) -> Result<()> {
        let session_id = session.session_id();
        if session.secret().is_none() {
            match self.store.load(session_id)? {
                // an earlier attempt may already have published this one
                Some(record) => session.restore_secret(&record)?,
                None => session.arm_secret(DrawSecret::generate(&mut rand::thread_rng()))?,
            }
        }
        let commitment = *session
            .commitment()
            .ok_or(DrawError::MissingSecret(session_id))?;
        self.checkpoint(session)?;

        let ix = self.program.commit_draw(operator, session_id, &commitment);
        self.submitter.invoke("commit_draw", operator, &[ix]).await?;
        session.confirm_commit()?;
        self.checkpoint(session)?;
        info!(session_id, commitment = %short_hex(&commitment), "commitment published");
        Ok(())
    }

    /// OPEN → CLOSED.
    async fn register_and_close(&self, session: &mut DrawSession, operator: &Pubkey) -> Result<()> {
        let session_id = session.session_id();
        self.ensure_secret(session)?;
        while let Some(participant) = session.next_to_register() {
            info!(session_id, participant = %short_address(&participant), "registering");
            let ix = self
                .program
                .register_participant(operator, session_id, &participant);
            self.submitter
                .invoke("register_participant", operator, &[ix])
                .await?;
            session.confirm_registration(participant)?;
            self.checkpoint(session)?;
        }

        let ix = self.program.close_registrations(operator, session_id);
        self.submitter
            .invoke("close_registrations", operator, &[ix])
            .await?;
        session.confirm_close()?;
        self.checkpoint(session)
    }

    /// CLOSED → REVEALED. Returns where the proof artifact was written.
    async fn reveal(&self, session: &mut DrawSession, operator: &Pubkey) -> Result<PathBuf> {
        let session_id = session.session_id();
        let secret = self.ensure_secret(session)?;

        let selection = session.preview_winner(&secret)?;
        let artifact = self.prover.prove(&ProofInputs {
            session_id,
            commitment: secret.commitment(),
            participant_count: session.registered().len() as u32,
            winner_index: selection.index,
        })?;
        let proof_path = artifact.write_to_dir(&self.proof_dir)?;

        let ix = self
            .program
            .reveal_winner(operator, session_id, &secret, &selection.address);
        self.submitter.invoke("reveal_winner", operator, &[ix]).await?;
        session.confirm_reveal(&secret)?;
        self.clear_recovery_copy(session_id);
        Ok(proof_path)
    }

    /// Pays the prize once. A session that is already paid returns its signature.
    async fn pay(&self, session: &mut DrawSession, operator: &Pubkey) -> Result<String> {
        if let Some(signature) = session.payout() {
            return Ok(signature.to_string());
        }
        let winner = session.winner().copied().ok_or(DrawError::Phase {
            expected: DrawPhase::Revealed,
            found: session.phase(),
        })?;
        let lamports = session
            .config()
            .map(|c| c.prize_lamports)
            .ok_or_else(|| DrawError::NotReady("complete the setup first".into()))?;

        let ix = prize_payment(operator, &winner.address, lamports);
        let receipt = self.submitter.invoke("prize_payment", operator, &[ix]).await?;
        session.record_payout(receipt.signature.clone())?;
        info!(
            session_id = session.session_id(),
            winner = %short_address(&winner.address),
            lamports,
            signature = %receipt.signature,
            "prize paid"
        );
        Ok(receipt.signature)
    }

    /// The secret in memory, or the one from the recovery copy.
    fn ensure_secret(&self, session: &mut DrawSession) -> Result<DrawSecret> {
        if let Some(secret) = session.secret() {
            return Ok(secret.clone());
        }
        let session_id = session.session_id();
        let record = self
            .store
            .load(session_id)?
            .ok_or(DrawError::MissingSecret(session_id))?;
        session.restore_secret(&record)?;
        info!(session_id, "secret restored from recovery copy");
        record.secret()
    }

    fn checkpoint(&self, session: &DrawSession) -> Result<()> {
        self.store.save(&session.record()?)
    }

    fn clear_recovery_copy(&self, session_id: u32) {
        if let Err(e) = self.store.clear(session_id) {
            warn!(session_id, error = %e, "could not clear recovery copy");
        }
    }
}
