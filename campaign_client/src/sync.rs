//! Pulls every campaign account owned by the program and serves ordered pages.

use std::sync::Arc;

use campaign_core::{
    order_by, paginate, paging::page_count, CampaignRecord, CodecError, Page, SortKey, SortOrder,
    WireLayout,
};
use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::{
    config::ClientConfig,
    error::Result,
    transport::{DataSlice, LedgerTransport},
};

fn as_base58<S: Serializer>(address: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(address)
}

/// An account as fetched, decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAccountEntry {
    pub address: Pubkey,
    pub data: Vec<u8>,
}

impl RemoteAccountEntry {
    pub fn decode(&self) -> std::result::Result<CampaignRecord, CodecError> {
        CampaignRecord::decode(&self.data).map(|(record, _)| record)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    #[serde(serialize_with = "as_base58")]
    pub address: Pubkey,
    pub record: CampaignRecord,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error(transparent)]
    Decode(#[from] CodecError),
    #[error("account disappeared between listing and fetch")]
    Missing,
}

/// One account that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub address: Pubkey,
    pub error: EntryError,
}

/// Decoded entries plus the ones that failed, which never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<DecodedEntry>,
    pub failures: Vec<EntryFailure>,
}

impl Listing {
    pub fn decode_all(raw: Vec<RemoteAccountEntry>) -> Self {
        let mut listing = Listing::default();
        for entry in raw {
            match entry.decode() {
                Ok(record) => listing.entries.push(DecodedEntry {
                    address: entry.address,
                    record,
                }),
                Err(error) => {
                    log::warn!("skipping {}: {}", entry.address, error);
                    listing.failures.push(EntryFailure {
                        address: entry.address,
                        error: error.into(),
                    });
                }
            }
        }
        listing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub page: Page<DecodedEntry>,
    pub failures: Vec<EntryFailure>,
}

pub struct AccountSynchronizer<T> {
    transport: Arc<T>,
    program_id: Pubkey,
    sort_key: SortKey,
    sort_order: SortOrder,
    page_size: usize,
}

impl<T: LedgerTransport> AccountSynchronizer<T> {
    pub fn new(transport: Arc<T>, config: &ClientConfig) -> Self {
        Self {
            transport,
            program_id: config.program_id,
            sort_key: config.sort_key,
            sort_order: config.sort_order,
            page_size: config.page_size,
        }
    }

    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.sort_order = order;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// One bulk query for every account the program owns, in fetch order.
    pub async fn fetch_entries(&self) -> Result<Vec<RemoteAccountEntry>> {
        let accounts = self
            .transport
            .get_program_accounts(&self.program_id, None)
            .await?;
        Ok(accounts
            .into_iter()
            .map(|(address, data)| RemoteAccountEntry { address, data })
            .collect())
    }

    pub fn order(&self, entries: &mut [DecodedEntry]) {
        let key = self.sort_key;
        order_by(entries, self.sort_order, |entry| entry.record.sort_value(key));
    }

    /// Every decodable record, ordered by the configured key.
    pub async fn list_all(&self) -> Result<Listing> {
        let raw = self.fetch_entries().await?;
        let mut listing = Listing::decode_all(raw);
        self.order(&mut listing.entries);
        log::info!(
            "listed {} campaigns ({} undecodable) under {}",
            listing.entries.len(),
            listing.failures.len(),
            self.program_id
        );
        Ok(listing)
    }

    /// Same ownership query as [`Self::list_all`] without any account data.
    pub async fn list_addresses(&self) -> Result<Vec<Pubkey>> {
        let accounts = self
            .transport
            .get_program_accounts(&self.program_id, Some(DataSlice::EMPTY))
            .await?;
        Ok(accounts.into_iter().map(|(address, _)| address).collect())
    }

    /// Page `number` of the ordered listing. Failures cover the whole listing.
    pub async fn ordered_page(&self, number: usize) -> Result<ListingPage> {
        let listing = self.list_all().await?;
        let page = Page::from_slice(&listing.entries, number, self.page_size)?;
        Ok(ListingPage {
            page,
            failures: listing.failures,
        })
    }

    /// Pages over addresses first and only downloads the data of one page.
    ///
    /// Cheaper than [`Self::ordered_page`] but in fetch order, since ordering
    /// needs every record's data.
    pub async fn fetch_page(&self, number: usize) -> Result<ListingPage> {
        let addresses = self.list_addresses().await?;
        let wanted = paginate(&addresses, number, self.page_size)?;

        let mut entries = Vec::with_capacity(wanted.len());
        let mut failures = Vec::new();
        if !wanted.is_empty() {
            log::debug!("fetching {} of {} accounts", wanted.len(), addresses.len());
            let datas = self.transport.get_multiple_account_data(wanted).await?;

            // a short response leaves the tail unmatched; report it missing
            for (i, address) in wanted.iter().enumerate() {
                match datas.get(i).cloned().flatten() {
                    Some(data) => {
                        let raw = RemoteAccountEntry {
                            address: *address,
                            data,
                        };
                        match raw.decode() {
                            Ok(record) => entries.push(DecodedEntry {
                                address: *address,
                                record,
                            }),
                            Err(error) => failures.push(EntryFailure {
                                address: *address,
                                error: error.into(),
                            }),
                        }
                    }
                    None => failures.push(EntryFailure {
                        address: *address,
                        error: EntryError::Missing,
                    }),
                }
            }
        }

        let page_count = page_count(addresses.len(), self.page_size);
        Ok(ListingPage {
            page: Page {
                number,
                size: self.page_size,
                total: addresses.len(),
                has_more: number >= 1 && number < page_count,
                items: entries,
            },
            failures,
        })
    }

    /// Reads and decodes one account. `None` if it does not exist.
    pub async fn fetch_record(&self, address: &Pubkey) -> Result<Option<CampaignRecord>> {
        match self.transport.get_account_data(address).await? {
            Some(data) => Ok(Some(CampaignRecord::decode(&data)?.0)),
            None => Ok(None),
        }
    }
}
