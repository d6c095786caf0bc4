//! In-memory ledger standing in for the cluster and the campaign program.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use campaign_client::{ClientConfig, ConfirmationStatus, DataSlice, LedgerTransport};
use campaign_core::{
    derive_campaign_address, encode_to_vec, CampaignFields, CampaignInstruction, CampaignRecord,
    MAX_RECORD_LEN,
};
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};

struct StoredAccount {
    address: Pubkey,
    owner: Pubkey,
    data: Vec<u8>,
}

struct ScriptedStatus {
    pending_polls: usize,
    outcome: ConfirmationStatus,
}

#[derive(Default)]
struct LedgerState {
    // insertion order doubles as fetch order
    accounts: Vec<StoredAccount>,
    balances: HashMap<Pubkey, u64>,
    statuses: HashMap<Signature, ScriptedStatus>,
    sent: Vec<Transaction>,
    // listed by ownership but gone by the time data is fetched
    vanishing: HashSet<Pubkey>,
    balance_queries: usize,
    funding_requests: usize,
}

/// Knobs for the failure paths.
#[derive(Debug, Clone)]
pub struct LedgerBehavior {
    /// Airdrops actually raise the balance.
    pub airdrop_credits: bool,
    pub airdrop_error: Option<String>,
    pub send_error: Option<String>,
    pub status_error: Option<String>,
    /// Polls answered `Pending` before a transaction settles. `usize::MAX`
    /// never settles.
    pub pending_polls: usize,
    /// Reads of single accounts come back empty, as if not yet propagated.
    pub stale_reads: bool,
}

impl Default for LedgerBehavior {
    fn default() -> Self {
        Self {
            airdrop_credits: true,
            airdrop_error: None,
            send_error: None,
            status_error: None,
            pending_polls: 1,
            stale_reads: false,
        }
    }
}

pub struct MockLedger {
    program_id: Pubkey,
    behavior: LedgerBehavior,
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new(program_id: Pubkey) -> Self {
        Self::with_behavior(program_id, LedgerBehavior::default())
    }

    pub fn with_behavior(program_id: Pubkey, behavior: LedgerBehavior) -> Self {
        Self {
            program_id,
            behavior,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn set_balance(&self, address: &Pubkey, lamports: u64) {
        self.state.lock().unwrap().balances.insert(*address, lamports);
    }

    pub fn balance(&self, address: &Pubkey) -> u64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Stores raw bytes under `owner`, bypassing the program.
    pub fn insert_raw(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().accounts.push(StoredAccount {
            address,
            owner,
            data,
        });
    }

    /// Stores `record` the way the program lays it out, padded to full size.
    pub fn insert_record(&self, address: Pubkey, record: &CampaignRecord) {
        self.insert_raw(address, self.program_id, padded(record));
    }

    pub fn remove(&self, address: &Pubkey) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .retain(|account| account.address != *address);
    }

    pub fn vanish_on_fetch(&self, address: Pubkey) {
        self.state.lock().unwrap().vanishing.insert(address);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn balance_queries(&self) -> usize {
        self.state.lock().unwrap().balance_queries
    }

    pub fn funding_requests(&self) -> usize {
        self.state.lock().unwrap().funding_requests
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    fn script(&self, state: &mut LedgerState, signature: Signature, outcome: ConfirmationStatus) {
        state.statuses.insert(
            signature,
            ScriptedStatus {
                pending_polls: self.behavior.pending_polls,
                outcome,
            },
        );
    }

    /// Runs the program's create instruction against the stored accounts.
    fn execute(&self, state: &mut LedgerState, transaction: &Transaction) -> ConfirmationStatus {
        let message = &transaction.message;
        let Some(ix) = message.instructions.first() else {
            return ConfirmationStatus::Failed("no instructions".into());
        };
        let program_id = message.account_keys[ix.program_id_index as usize];
        if program_id != self.program_id {
            return ConfirmationStatus::Failed(format!("unknown program {program_id}"));
        }
        let keys: Vec<Pubkey> = ix
            .accounts
            .iter()
            .map(|i| message.account_keys[*i as usize])
            .collect();
        if keys.len() < 2 || !message.is_signer(ix.accounts[0] as usize) {
            return ConfirmationStatus::Failed("missing required signature".into());
        }
        let (payer, target) = (keys[0], keys[1]);

        let fields = match CampaignInstruction::unpack(&ix.data) {
            Ok(ix) => ix.fields().clone(),
            Err(e) => return ConfirmationStatus::Failed(format!("invalid instruction data: {e}")),
        };
        match derive_campaign_address(&payer, &fields.title, &self.program_id) {
            Ok(derived) if derived.address == target => {}
            _ => return ConfirmationStatus::Failed("invalid seeds".into()),
        }
        if state.accounts.iter().any(|account| account.address == target) {
            return ConfirmationStatus::Failed(format!("account {target} already in use"));
        }

        state.accounts.push(StoredAccount {
            address: target,
            owner: self.program_id,
            data: padded(&CampaignRecord::new(fields)),
        });
        ConfirmationStatus::Confirmed
    }
}

fn padded(record: &CampaignRecord) -> Vec<u8> {
    let mut data = encode_to_vec(record).expect("record fits");
    data.resize(MAX_RECORD_LEN, 0);
    data
}

#[async_trait]
impl LedgerTransport for MockLedger {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.balance_queries += 1;
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn request_funding(&self, address: &Pubkey, lamports: u64) -> Result<Signature> {
        let mut state = self.state.lock().unwrap();
        state.funding_requests += 1;
        if let Some(reason) = &self.behavior.airdrop_error {
            bail!("airdrop refused: {reason}");
        }
        if self.behavior.airdrop_credits {
            *state.balances.entry(*address).or_default() += lamports;
        }
        let signature = Signature::new_unique();
        self.script(&mut state, signature, ConfirmationStatus::Confirmed);
        Ok(signature)
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(transaction.clone());
        if let Some(reason) = &self.behavior.send_error {
            bail!("{reason}");
        }
        transaction
            .verify()
            .map_err(|e| anyhow!("signature verification failed: {e}"))?;

        let signature = transaction.signatures[0];
        let outcome = self.execute(&mut state, transaction);
        self.script(&mut state, signature, outcome);
        Ok(signature)
    }

    async fn confirmation_status(&self, signature: &Signature) -> Result<ConfirmationStatus> {
        if let Some(reason) = &self.behavior.status_error {
            bail!("{reason}");
        }
        let mut state = self.state.lock().unwrap();
        let Some(status) = state.statuses.get_mut(signature) else {
            return Ok(ConfirmationStatus::Pending);
        };
        if status.pending_polls > 0 {
            status.pending_polls -= 1;
            return Ok(ConfirmationStatus::Pending);
        }
        Ok(status.outcome.clone())
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        if self.behavior.stale_reads {
            return Ok(None);
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|account| account.address == *address)
            .map(|account| account.data.clone()))
    }

    async fn get_multiple_account_data(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        let state = self.state.lock().unwrap();
        Ok(addresses
            .iter()
            .map(|address| {
                if state.vanishing.contains(address) {
                    return None;
                }
                state
                    .accounts
                    .iter()
                    .find(|account| account.address == *address)
                    .map(|account| account.data.clone())
            })
            .collect())
    }

    async fn get_program_accounts(
        &self,
        owner: &Pubkey,
        slice: Option<DataSlice>,
    ) -> Result<Vec<(Pubkey, Vec<u8>)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .filter(|account| account.owner == *owner)
            .map(|account| {
                let data = match slice {
                    Some(slice) => {
                        let start = slice.offset.min(account.data.len());
                        let end = (slice.offset + slice.length).min(account.data.len());
                        account.data[start..end].to_vec()
                    }
                    None => account.data.clone(),
                };
                (account.address, data)
            })
            .collect())
    }
}

/// Short timings so the polling paths finish quickly.
pub fn test_config(program_id: Pubkey) -> ClientConfig {
    ClientConfig {
        program_id,
        confirm_timeout_ms: 2_000,
        poll_interval_ms: 5,
        consistency_wait_ms: 0,
        ..ClientConfig::default()
    }
}

pub fn campaign(title: &str) -> CampaignFields {
    CampaignFields {
        title: title.to_string(),
        rating: 5,
        description: format!("{title} campaign"),
        recipient: "ewoakgeokgeaokgeako".to_string(),
        entry_fee: 10,
        funding: 1000,
    }
}
