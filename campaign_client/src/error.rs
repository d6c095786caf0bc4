use campaign_core::{AddressError, CodecError, InstructionError, PageError};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

use crate::submit::SubmissionStage;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Instruction(#[from] InstructionError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("transaction {signature} failed: {reason}")]
    SubmissionFailed { signature: Signature, reason: String },
    #[error("could not fund {address} (balance {balance} lamports): {reason}")]
    FundingFailed {
        address: Pubkey,
        balance: u64,
        reason: String,
    },
    #[error("transaction is {size} bytes, packet limit is {limit}")]
    TransactionTooLarge { size: u64, limit: usize },
    #[error("cancelled during {stage}")]
    Cancelled { stage: SubmissionStage },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
