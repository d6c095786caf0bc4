use std::{str::FromStr, time::Duration};

use campaign_core::{SortKey, SortOrder, DEFAULT_PAGE_SIZE};
use dotenvy::dotenv;
use serde::{Deserialize, Deserializer};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    native_token::LAMPORTS_PER_SOL,
    pubkey,
    pubkey::Pubkey,
    signer::keypair::{read_keypair_file, Keypair},
};

use crate::error::{ClientError, Result};

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_PROGRAM_ID: Pubkey = pubkey!("CenYq6bDRB7p73EjsPEpiYN7uveyPUTdXkDkgUduboaN");

/// Everything a client needs, passed into each component's constructor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    #[serde(deserialize_with = "pubkey_from_str")]
    pub program_id: Pubkey,
    pub commitment: CommitmentLevel,
    pub request_timeout_ms: u64,
    pub confirm_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Best-effort pause after confirmation before reading back what was
    /// written. Does not guarantee the read sees the write.
    pub consistency_wait_ms: u64,
    /// Below this many lamports the signer is topped up before submitting.
    pub min_balance: u64,
    pub funding_amount: u64,
    pub page_size: usize,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: DEFAULT_PROGRAM_ID,
            commitment: CommitmentLevel::Confirmed,
            request_timeout_ms: 30_000,
            confirm_timeout_ms: 60_000,
            poll_interval_ms: 500,
            consistency_wait_ms: 1_000,
            min_balance: LAMPORTS_PER_SOL,
            funding_amount: 2 * LAMPORTS_PER_SOL,
            page_size: DEFAULT_PAGE_SIZE,
            sort_key: SortKey::Title,
            sort_order: SortOrder::Descending,
        }
    }
}

fn pubkey_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Pubkey, D::Error> {
    let s = String::deserialize(deserializer)?;
    Pubkey::from_str(&s).map_err(serde::de::Error::custom)
}

fn env_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ClientError::Config(format!("{name}: {e}"))),
        _ => Ok(None),
    }
}

impl ClientConfig {
    /// Defaults overridden by `CAMPAIGN_*` variables, `.env` included.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let mut config = Self::default();

        if let Some(url) = env_var::<String>("CAMPAIGN_RPC_URL")? {
            config.rpc_url = url;
        }
        if let Some(program_id) = env_var::<Pubkey>("CAMPAIGN_PROGRAM_ID")? {
            config.program_id = program_id;
        }
        if let Some(commitment) = env_var::<String>("CAMPAIGN_COMMITMENT")? {
            config.commitment = parse_commitment(&commitment)?;
        }
        if let Some(v) = env_var("CAMPAIGN_REQUEST_TIMEOUT_MS")? {
            config.request_timeout_ms = v;
        }
        if let Some(v) = env_var("CAMPAIGN_CONFIRM_TIMEOUT_MS")? {
            config.confirm_timeout_ms = v;
        }
        if let Some(v) = env_var("CAMPAIGN_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = v;
        }
        if let Some(v) = env_var("CAMPAIGN_CONSISTENCY_WAIT_MS")? {
            config.consistency_wait_ms = v;
        }
        if let Some(v) = env_var("CAMPAIGN_MIN_BALANCE")? {
            config.min_balance = v;
        }
        if let Some(v) = env_var("CAMPAIGN_FUNDING_AMOUNT")? {
            config.funding_amount = v;
        }
        if let Some(v) = env_var("CAMPAIGN_PAGE_SIZE")? {
            config.page_size = v;
        }
        if let Some(key) = env_var::<SortKey>("CAMPAIGN_SORT_KEY")? {
            config.sort_key = key;
        }
        if let Some(order) = env_var::<SortOrder>("CAMPAIGN_SORT_ORDER")? {
            config.sort_order = order;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ClientError::Config("page_size must be greater than zero".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ClientError::Config(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.funding_amount < self.min_balance {
            log::warn!(
                "funding_amount {} is below min_balance {}, one top-up may not be enough",
                self.funding_amount,
                self.min_balance
            );
        }
        Ok(())
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn consistency_wait(&self) -> Duration {
        Duration::from_millis(self.consistency_wait_ms)
    }
}

fn parse_commitment(raw: &str) -> Result<CommitmentLevel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentLevel::Processed),
        "confirmed" => Ok(CommitmentLevel::Confirmed),
        "finalized" => Ok(CommitmentLevel::Finalized),
        other => Err(ClientError::Config(format!("unknown commitment `{other}`"))),
    }
}

/// Loads the signer from env var `name`.
///
/// The value is either a JSON byte array (the format `solana-keygen` writes)
/// or a path to a keypair file.
pub fn load_signer(name: &str) -> Result<Keypair> {
    dotenv().ok();
    let raw = std::env::var(name).map_err(|_| ClientError::Config(format!("{name} is not set")))?;
    keypair_from_str(&raw)
}

pub fn keypair_from_str(raw: &str) -> Result<Keypair> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let bytes: Vec<u8> =
            serde_json::from_str(raw).map_err(|e| ClientError::Config(format!("keypair json: {e}")))?;
        return Keypair::from_bytes(&bytes)
            .map_err(|e| ClientError::Config(format!("keypair bytes: {e}")));
    }

    read_keypair_file(raw).map_err(|e| ClientError::Config(format!("keypair file {raw}: {e}")))
}
