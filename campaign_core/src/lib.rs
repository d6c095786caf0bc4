//! Wire-level pieces of the campaign program client: the record codec,
//! address derivation, instruction construction and listing order/paging.
//!
//! Everything here is synchronous and free of I/O.

pub mod address;
pub mod codec;
pub mod error;
pub mod instruction;
pub mod paging;
pub mod state;

pub use address::{derive, derive_campaign_address, DerivedAddress};
pub use codec::{encode_into, encode_to_vec, WireLayout, MAX_RECORD_LEN, MIN_ENCODED_LEN};
pub use error::{AddressError, CodecError, InstructionError, PageError};
pub use instruction::{build, create_campaign_instruction};
pub use paging::{order_by, paginate, Page, SortKey, SortOrder, DEFAULT_PAGE_SIZE};
pub use state::{CampaignFields, CampaignInstruction, CampaignRecord, CREATE_VARIANT};
