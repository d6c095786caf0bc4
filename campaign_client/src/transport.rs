//! What the client needs from the cluster, and the JSON-RPC implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_account_decoder::{UiAccountEncoding, UiDataSliceConfig};
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::TransactionStatus;

use crate::config::ClientConfig;

/// Where a sent transaction stands relative to the configured commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Failed(String),
}

/// Window of account data to return from a bulk query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSlice {
    pub offset: usize,
    pub length: usize,
}

impl DataSlice {
    /// No data at all, only addresses.
    pub const EMPTY: DataSlice = DataSlice {
        offset: 0,
        length: 0,
    };
}

#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// Asks the cluster to credit `lamports`; returns the funding transaction.
    async fn request_funding(&self, address: &Pubkey, lamports: u64) -> Result<Signature>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    async fn confirmation_status(&self, signature: &Signature) -> Result<ConfirmationStatus>;

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Same order as `addresses`; absent accounts are `None`.
    async fn get_multiple_account_data(&self, addresses: &[Pubkey])
        -> Result<Vec<Option<Vec<u8>>>>;

    /// Every account owned by `owner`, filtered by ownership only.
    async fn get_program_accounts(
        &self,
        owner: &Pubkey,
        slice: Option<DataSlice>,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>>;
}

pub struct RpcTransport {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcTransport {
    pub fn new(url: String, commitment: CommitmentConfig, timeout: Duration) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(url, timeout, commitment),
            commitment,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.rpc_url.clone(),
            config.commitment_config(),
            config.request_timeout(),
        )
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

/// Maps an RPC signature status onto [`ConfirmationStatus`]. Unknown
/// signatures are still pending.
pub fn classify_status(
    status: Option<&TransactionStatus>,
    commitment: CommitmentConfig,
) -> ConfirmationStatus {
    let Some(status) = status else {
        return ConfirmationStatus::Pending;
    };
    if let Some(err) = status.err.as_ref() {
        return ConfirmationStatus::Failed(err.to_string());
    }
    if status.satisfies_commitment(commitment) {
        ConfirmationStatus::Confirmed
    } else {
        ConfirmationStatus::Pending
    }
}

#[async_trait]
impl LedgerTransport for RpcTransport {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.client
            .get_balance(address)
            .await
            .with_context(|| format!("balance of {address}"))
    }

    async fn request_funding(&self, address: &Pubkey, lamports: u64) -> Result<Signature> {
        self.client
            .request_airdrop(address, lamports)
            .await
            .with_context(|| format!("airdrop of {lamports} lamports to {address}"))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("latest blockhash")
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(self.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .context("send transaction")
    }

    async fn confirmation_status(&self, signature: &Signature) -> Result<ConfirmationStatus> {
        let statuses: Vec<Option<TransactionStatus>> = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .with_context(|| format!("status of {signature}"))?
            .value;

        Ok(classify_status(
            statuses.into_iter().next().flatten().as_ref(),
            self.commitment,
        ))
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let account = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .with_context(|| format!("account {address}"))?
            .value;
        Ok(account.map(|account| account.data))
    }

    async fn get_multiple_account_data(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        let accounts = self
            .client
            .get_multiple_accounts_with_commitment(addresses, self.commitment)
            .await
            .with_context(|| format!("{} accounts", addresses.len()))?
            .value;
        Ok(accounts
            .into_iter()
            .map(|account| account.map(|account| account.data))
            .collect())
    }

    async fn get_program_accounts(
        &self,
        owner: &Pubkey,
        slice: Option<DataSlice>,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let config = RpcProgramAccountsConfig {
            filters: None,
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: slice.map(|s| UiDataSliceConfig {
                    offset: s.offset,
                    length: s.length,
                }),
                commitment: Some(self.commitment),
                min_context_slot: None,
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self
            .client
            .get_program_accounts_with_config(owner, config)
            .await
            .with_context(|| format!("accounts owned by {owner}"))?;
        log::debug!("fetched {} accounts owned by {}", accounts.len(), owner);

        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, account.data))
            .collect())
    }
}
