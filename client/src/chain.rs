//! Wallet and RPC collaborators, and the submit-then-poll path every
//! protocol step goes through.

use std::time::Duration;

use solana_program::instruction::Instruction;
use solana_program::message::Message;
use solana_program::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{DrawError, Result};

/// A simulated and assembled transaction, ready for the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransaction {
    pub message: Message,
    pub units_consumed: Option<u64>,
}

/// Wire bytes of a transaction signed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub wire: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Not final yet; keep polling.
    Pending,
    Success,
    Failed(String),
}

/// Byte-range match applied to account data when listing program accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        data.get(self.offset..self.offset + self.bytes.len()) == Some(self.bytes.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub signature: String,
    pub polls: u32,
}

/// Browser or hardware wallet holding the operator key.
#[allow(async_fn_in_trait)]
pub trait Wallet {
    /// Asks the user to expose an address. Refusal is `WalletDenied`.
    async fn request_access(&self) -> Result<Pubkey>;

    async fn sign_transaction(
        &self,
        tx: &PreparedTransaction,
        network: &str,
    ) -> Result<SignedTransaction>;
}

/// RPC node. Implementations report `Simulation` and `Submission` errors.
#[allow(async_fn_in_trait)]
pub trait Rpc {
    /// Simulates `instructions` paid by `payer` and returns the assembled transaction.
    async fn simulate(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<PreparedTransaction>;

    /// Sends a signed transaction and returns its signature.
    async fn submit(&self, tx: &SignedTransaction) -> Result<String>;

    async fn status(&self, signature: &str) -> Result<TxStatus>;

    /// Raw data of `address`, `None` if the account does not exist.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Accounts owned by `program_id` whose data passes every filter.
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;
}

/// Runs one protocol step: simulate, sign, submit, then poll until final.
///
/// Only `Pending` is retried. Failed simulation, refused signature, refused
/// submission and on-chain failure all return at once.
pub struct Submitter<W, R> {
    wallet: W,
    rpc: R,
    network: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl<W: Wallet, R: Rpc> Submitter<W, R> {
    pub fn new(wallet: W, rpc: R, config: &ClientConfig) -> Self {
        Self {
            wallet,
            rpc,
            network: config.network.clone(),
            poll_interval: config.poll_interval(),
            max_polls: config.max_polls,
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub async fn invoke(
        &self,
        label: &str,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<TxReceipt> {
        let prepared = self.rpc.simulate(payer, instructions).await?;
        debug!(step = label, units = ?prepared.units_consumed, "simulated");

        let signed = self
            .wallet
            .sign_transaction(&prepared, &self.network)
            .await?;

        let signature = self.rpc.submit(&signed).await?;
        info!(step = label, %signature, "submitted");

        let receipt = self.wait_for_finality(&signature).await?;
        info!(step = label, %signature, polls = receipt.polls, "confirmed");
        Ok(receipt)
    }

    async fn wait_for_finality(&self, signature: &str) -> Result<TxReceipt> {
        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            match self.rpc.status(signature).await? {
                TxStatus::Success => {
                    return Ok(TxReceipt {
                        signature: signature.to_string(),
                        polls: attempt,
                    })
                }
                TxStatus::Failed(reason) => {
                    warn!(%signature, %reason, "transaction failed on-chain");
                    return Err(DrawError::OnChain(reason));
                }
                TxStatus::Pending => {}
            }
        }
        Err(DrawError::ConfirmationTimeout {
            signature: signature.to_string(),
            attempts: self.max_polls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{test_config, MockRpc, MockWallet};
    use solana_program::system_instruction;

    fn transfer(payer: &Pubkey) -> Vec<Instruction> {
        vec![system_instruction::transfer(payer, &Pubkey::new_unique(), 1)]
    }

    #[test]
    fn memcmp_filter_checks_bounds() {
        let filter = MemcmpFilter::new(2, vec![7, 8]);
        assert!(filter.matches(&[0, 0, 7, 8, 9]));
        assert!(!filter.matches(&[0, 0, 7, 9]));
        assert!(!filter.matches(&[0, 0, 7]));
    }

    #[tokio::test]
    async fn polls_until_success() {
        let payer = Pubkey::new_unique();
        let rpc = MockRpc::new();
        rpc.script_statuses([TxStatus::Pending, TxStatus::Pending]);
        let submitter = Submitter::new(MockWallet::new(payer), rpc, &test_config());

        let receipt = submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap();
        assert_eq!(receipt.polls, 3);
        assert_eq!(submitter.rpc().submitted().len(), 1);
    }

    #[tokio::test]
    async fn failed_status_is_on_chain_error() {
        let payer = Pubkey::new_unique();
        let rpc = MockRpc::new();
        rpc.script_statuses([TxStatus::Pending, TxStatus::Failed("custom program error: 0x1776".into())]);
        let submitter = Submitter::new(MockWallet::new(payer), rpc, &test_config());

        let err = submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap_err();
        assert_eq!(err, DrawError::OnChain("custom program error: 0x1776".into()));
        assert_eq!(submitter.rpc().status_calls(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_poll_budget() {
        let payer = Pubkey::new_unique();
        let rpc = MockRpc::new();
        rpc.script_statuses(std::iter::repeat(TxStatus::Pending).take(10));
        let mut config = test_config();
        config.max_polls = 4;
        let submitter = Submitter::new(MockWallet::new(payer), rpc, &config);

        let err = submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap_err();
        assert!(matches!(err, DrawError::ConfirmationTimeout { attempts: 4, .. }));
        assert_eq!(submitter.rpc().status_calls(), 4);
    }

    #[tokio::test]
    async fn simulation_failure_is_not_retried() {
        let payer = Pubkey::new_unique();
        let rpc = MockRpc::new();
        rpc.fail_simulation_at(0, "insufficient funds");
        let submitter = Submitter::new(MockWallet::new(payer), rpc, &test_config());

        let err = submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap_err();
        assert_eq!(err, DrawError::Simulation("insufficient funds".into()));
        assert_eq!(submitter.rpc().simulate_calls(), 1);
        assert!(submitter.rpc().submitted().is_empty());
        assert_eq!(submitter.wallet().signatures(), 0);
    }

    #[tokio::test]
    async fn wallet_refusal_stops_before_submit() {
        let payer = Pubkey::new_unique();
        let wallet = MockWallet::new(payer);
        wallet.refuse_signing();
        let submitter = Submitter::new(wallet, MockRpc::new(), &test_config());

        let err = submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap_err();
        assert!(matches!(err, DrawError::WalletDenied(_)));
        assert!(submitter.rpc().submitted().is_empty());

        // nothing is retried on its own; the next call goes through once approved
        submitter.wallet().allow_signing();
        submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap();
        assert_eq!(submitter.rpc().submitted().len(), 1);
        assert_eq!(submitter.wallet().signatures(), 1);
    }

    #[tokio::test]
    async fn submission_refusal_is_surfaced() {
        let payer = Pubkey::new_unique();
        let rpc = MockRpc::new();
        rpc.fail_submission_at(0, "blockhash not found");
        let submitter = Submitter::new(MockWallet::new(payer), rpc, &test_config());

        let err = submitter.invoke("transfer", &payer, &transfer(&payer)).await.unwrap_err();
        assert_eq!(err, DrawError::Submission("blockhash not found".into()));
        assert_eq!(submitter.rpc().status_calls(), 0);
    }
}
