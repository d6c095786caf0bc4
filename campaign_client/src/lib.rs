//! Async client for the campaign program: submits create requests and lists
//! what the program has stored.

pub mod config;
pub mod error;
pub mod submit;
pub mod sync;
pub mod transport;

use std::sync::Arc;

use campaign_core::{CampaignFields, CampaignRecord};
use solana_sdk::{pubkey::Pubkey, signer::Signer};
use tokio_util::sync::CancellationToken;

pub use config::{keypair_from_str, load_signer, ClientConfig, DEFAULT_PROGRAM_ID, DEFAULT_RPC_URL};
pub use error::{ClientError, Result};
pub use submit::{SubmissionReceipt, SubmissionStage, Submitter};
pub use sync::{
    AccountSynchronizer, DecodedEntry, EntryError, EntryFailure, Listing, ListingPage,
    RemoteAccountEntry,
};
pub use transport::{ConfirmationStatus, DataSlice, LedgerTransport, RpcTransport};

/// Submitter and synchronizer sharing one transport.
pub struct CampaignClient<T, S> {
    submitter: Submitter<T, S>,
    synchronizer: AccountSynchronizer<T>,
}

impl<S: Signer> CampaignClient<RpcTransport, S> {
    pub fn connect(config: ClientConfig, signer: S) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(RpcTransport::from_config(&config));
        log::info!("connecting to {} as {}", transport.url(), signer.pubkey());
        Ok(Self::new(transport, signer, config))
    }
}

impl<T, S> CampaignClient<T, S>
where
    T: LedgerTransport,
    S: Signer,
{
    pub fn new(transport: Arc<T>, signer: S, config: ClientConfig) -> Self {
        let synchronizer = AccountSynchronizer::new(transport.clone(), &config);
        Self {
            submitter: Submitter::new(transport, signer, config),
            synchronizer,
        }
    }

    pub fn submitter(&self) -> &Submitter<T, S> {
        &self.submitter
    }

    pub fn synchronizer(&self) -> &AccountSynchronizer<T> {
        &self.synchronizer
    }

    pub fn payer(&self) -> Pubkey {
        self.submitter.payer()
    }

    pub async fn create(
        &self,
        fields: &CampaignFields,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt> {
        self.submitter.submit_create(fields, cancel).await
    }

    pub async fn create_and_fetch(
        &self,
        fields: &CampaignFields,
        cancel: &CancellationToken,
    ) -> Result<(SubmissionReceipt, Option<CampaignRecord>)> {
        self.submitter.create_and_fetch(fields, cancel).await
    }

    pub async fn list_all(&self) -> Result<Listing> {
        self.synchronizer.list_all().await
    }

    pub async fn page(&self, number: usize) -> Result<ListingPage> {
        self.synchronizer.ordered_page(number).await
    }
}
