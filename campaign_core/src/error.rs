use thiserror::Error;

/// Schema violations on either side of the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer holds {capacity} bytes, {required} required")]
    TruncatedBuffer { required: usize, capacity: usize },
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("unknown instruction variant {0}")]
    UnknownVariant(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("seed {index} is {len} bytes, max is 32")]
    SeedTooLong { index: usize, len: usize },
    #[error("{0} seeds given, at most 15 allowed alongside the bump")]
    TooManySeeds(usize),
    #[error("no bump seed yields an off-curve address")]
    NoViableBump,
    #[error("address derivation rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    #[error("payload of {0} bytes is outside the accepted range")]
    MalformedPayload(usize),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}
