//! In-process wallet and RPC doubles for tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use anchor_lang::{AccountSerialize, Discriminator};
use prize_draw::state::{DrawPhase as ChainPhase, DrawSession as DrawAccount, Entry};
use solana_program::instruction::Instruction;
use solana_program::message::Message;
use solana_program::pubkey::Pubkey;
use solana_program::system_program;

use crate::chain::{MemcmpFilter, PreparedTransaction, Rpc, SignedTransaction, TxStatus, Wallet};
use crate::config::ClientConfig;
use crate::error::{DrawError, Result};

pub fn test_config() -> ClientConfig {
    ClientConfig {
        poll_interval_ms: 1,
        ..ClientConfig::default()
    }
}

/// Names the instruction by its Anchor discriminator.
pub fn instruction_name(ix: &Instruction) -> &'static str {
    if ix.program_id == system_program::ID {
        return "transfer";
    }
    let Some(tag) = ix.data.get(..8) else {
        return "unknown";
    };
    if tag == &prize_draw::instruction::CommitDraw::DISCRIMINATOR[..] {
        "commit_draw"
    } else if tag == &prize_draw::instruction::RegisterParticipant::DISCRIMINATOR[..] {
        "register_participant"
    } else if tag == &prize_draw::instruction::CloseRegistrations::DISCRIMINATOR[..] {
        "close_registrations"
    } else if tag == &prize_draw::instruction::RevealWinner::DISCRIMINATOR[..] {
        "reveal_winner"
    } else {
        "unknown"
    }
}

/// Account data as the program would store it.
pub fn account_bytes<T: AccountSerialize>(account: &T) -> Vec<u8> {
    let mut data = Vec::new();
    account.try_serialize(&mut data).unwrap();
    data
}

pub fn draw_account(
    session_id: u32,
    authority: Pubkey,
    commitment: [u8; 32],
    num_participants: u32,
    phase: ChainPhase,
) -> DrawAccount {
    DrawAccount {
        bump: 255,
        session_id,
        authority,
        commitment,
        num_participants,
        phase,
        winner_index: 0,
        winner: Pubkey::default(),
        revealed_secret: 0,
        revealed_salt: [0; 32],
    }
}

pub fn entry_account(draw: Pubkey, participant: Pubkey, index: u32) -> Entry {
    Entry {
        bump: 254,
        draw,
        participant,
        index,
    }
}

pub struct MockWallet {
    key: Pubkey,
    deny_access: AtomicBool,
    refuse_signing: AtomicBool,
    signatures: AtomicU32,
}

impl MockWallet {
    pub fn new(key: Pubkey) -> Self {
        Self {
            key,
            deny_access: AtomicBool::new(false),
            refuse_signing: AtomicBool::new(false),
            signatures: AtomicU32::new(0),
        }
    }

    pub fn deny_access(&self) {
        self.deny_access.store(true, Ordering::SeqCst);
    }

    pub fn refuse_signing(&self) {
        self.refuse_signing.store(true, Ordering::SeqCst);
    }

    pub fn allow_signing(&self) {
        self.refuse_signing.store(false, Ordering::SeqCst);
    }

    pub fn signatures(&self) -> u32 {
        self.signatures.load(Ordering::SeqCst)
    }
}

impl Wallet for MockWallet {
    async fn request_access(&self) -> Result<Pubkey> {
        if self.deny_access.load(Ordering::SeqCst) {
            return Err(DrawError::WalletDenied("user rejected the request".into()));
        }
        Ok(self.key)
    }

    async fn sign_transaction(
        &self,
        tx: &PreparedTransaction,
        _network: &str,
    ) -> Result<SignedTransaction> {
        if self.refuse_signing.load(Ordering::SeqCst) {
            return Err(DrawError::WalletDenied("user declined to sign".into()));
        }
        self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(SignedTransaction {
            wire: tx.message.serialize(),
        })
    }
}

#[derive(Default)]
struct RpcState {
    statuses: VecDeque<TxStatus>,
    simulate_calls: usize,
    submit_calls: usize,
    status_calls: u32,
    simulation_failure: Option<(usize, String)>,
    submission_failure: Option<(usize, String)>,
    simulated: Vec<Instruction>,
    submitted: Vec<String>,
    /// address -> (owner, data)
    accounts: BTreeMap<Pubkey, (Pubkey, Vec<u8>)>,
}

/// Scripted RPC node. Statuses are served in order and every poll after the
/// script runs out reports `Success`.
#[derive(Default)]
pub struct MockRpc {
    state: Mutex<RpcState>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RpcState> {
        self.state.lock().unwrap()
    }

    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = TxStatus>) {
        self.state().statuses.extend(statuses);
    }

    /// Fails the `call`-th simulation (0-based), once.
    pub fn fail_simulation_at(&self, call: usize, reason: &str) {
        self.state().simulation_failure = Some((call, reason.to_string()));
    }

    /// Refuses the `call`-th submission (0-based), once.
    pub fn fail_submission_at(&self, call: usize, reason: &str) {
        self.state().submission_failure = Some((call, reason.to_string()));
    }

    pub fn simulate_calls(&self) -> usize {
        self.state().simulate_calls
    }

    pub fn status_calls(&self) -> u32 {
        self.state().status_calls
    }

    pub fn submitted(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    /// Every instruction that passed simulation, in order.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.state().simulated.clone()
    }

    pub fn instruction_names(&self) -> Vec<&'static str> {
        self.state().simulated.iter().map(instruction_name).collect()
    }

    pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state().accounts.insert(address, (owner, data));
    }
}

impl Rpc for MockRpc {
    async fn simulate(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<PreparedTransaction> {
        let mut state = self.state();
        let call = state.simulate_calls;
        state.simulate_calls += 1;
        if matches!(&state.simulation_failure, Some((at, _)) if *at == call) {
            if let Some((_, reason)) = state.simulation_failure.take() {
                return Err(DrawError::Simulation(reason));
            }
        }
        state.simulated.extend_from_slice(instructions);
        Ok(PreparedTransaction {
            message: Message::new(instructions, Some(payer)),
            units_consumed: Some(5_000),
        })
    }

    async fn submit(&self, _tx: &SignedTransaction) -> Result<String> {
        let mut state = self.state();
        let call = state.submit_calls;
        state.submit_calls += 1;
        if matches!(&state.submission_failure, Some((at, _)) if *at == call) {
            if let Some((_, reason)) = state.submission_failure.take() {
                return Err(DrawError::Submission(reason));
            }
        }
        let signature = format!("sig-{}", call);
        state.submitted.push(signature.clone());
        Ok(signature)
    }

    async fn status(&self, _signature: &str) -> Result<TxStatus> {
        let mut state = self.state();
        state.status_calls += 1;
        Ok(state.statuses.pop_front().unwrap_or(TxStatus::Success))
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.state().accounts.get(address).map(|(_, data)| data.clone()))
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        Ok(self
            .state()
            .accounts
            .iter()
            .filter(|(_, (owner, data))| {
                owner == program_id && filters.iter().all(|f| f.matches(data))
            })
            .map(|(address, (_, data))| (*address, data.clone()))
            .collect())
    }
}
