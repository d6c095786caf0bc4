use std::io::{Result as IoResult, Write};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    codec::{check_min_len, decode_prefix, str_len, WireLayout},
    error::CodecError,
    paging::SortKey,
};

/// Discriminant of [`CampaignInstruction::Create`].
pub const CREATE_VARIANT: u8 = 0;

/// Ordered body shared by the create payload and the stored account.
///
/// Field order here is the wire order.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq,
)]
pub struct CampaignFields {
    pub title: String,
    pub rating: u8,
    pub description: String,
    /// External wallet identifier, kept as free text.
    pub recipient: String,
    pub entry_fee: u32,
    pub funding: u32,
}

impl CampaignFields {
    pub fn encoded_len(&self) -> usize {
        str_len(&self.title)
            + 1
            + str_len(&self.description)
            + str_len(&self.recipient)
            + 4
            + 4
    }
}

/// Account data as stored by the program: an initialized flag, then the body.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq,
)]
pub struct CampaignRecord {
    pub is_initialized: bool,
    #[serde(flatten)]
    pub fields: CampaignFields,
}

impl CampaignRecord {
    pub fn new(fields: CampaignFields) -> Self {
        Self {
            is_initialized: true,
            fields,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn sort_value(&self, key: SortKey) -> &str {
        match key {
            SortKey::Title => &self.fields.title,
            SortKey::Description => &self.fields.description,
            SortKey::Recipient => &self.fields.recipient,
        }
    }
}

impl WireLayout for CampaignRecord {
    fn encoded_len(&self) -> usize {
        1 + self.fields.encoded_len()
    }

    fn decode(input: &[u8]) -> Result<(Self, usize), CodecError> {
        check_min_len(input)?;
        decode_prefix(input)
    }
}

/// Requests understood by the program.
///
/// Accounts expected by `Create`:
///
/// 0. `[signer]` payer creating the campaign
/// 1. `[writable]` campaign account, derived from `[payer, title]`
/// 2. `[]` system program
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum CampaignInstruction {
    Create(CampaignFields),
}

impl CampaignInstruction {
    pub fn variant(&self) -> u8 {
        match self {
            Self::Create(_) => CREATE_VARIANT,
        }
    }

    pub fn fields(&self) -> &CampaignFields {
        match self {
            Self::Create(fields) => fields,
        }
    }

    /// Unpacks inbound instruction data into its variant.
    pub fn unpack(input: &[u8]) -> Result<Self, CodecError> {
        Self::decode(input).map(|(ix, _)| ix)
    }

    /// The record the program stores once this request executes.
    pub fn into_record(self) -> CampaignRecord {
        match self {
            Self::Create(fields) => CampaignRecord::new(fields),
        }
    }
}

impl BorshSerialize for CampaignInstruction {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        BorshSerialize::serialize(&self.variant(), writer)?;
        match self {
            Self::Create(fields) => BorshSerialize::serialize(fields, writer),
        }
    }
}

impl WireLayout for CampaignInstruction {
    fn encoded_len(&self) -> usize {
        1 + self.fields().encoded_len()
    }

    fn decode(input: &[u8]) -> Result<(Self, usize), CodecError> {
        check_min_len(input)?;
        let (variant, rest) = input
            .split_first()
            .ok_or_else(|| CodecError::MalformedRecord("empty instruction".into()))?;

        match *variant {
            CREATE_VARIANT => {
                let (fields, consumed) = decode_prefix::<CampaignFields>(rest)?;
                Ok((Self::Create(fields), 1 + consumed))
            }
            other => Err(CodecError::UnknownVariant(other)),
        }
    }
}
