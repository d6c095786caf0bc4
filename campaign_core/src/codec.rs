//! Fixed-layout encoding shared by the create instruction and the stored
//! account.
//!
//! Layouts are borsh-compatible: `u8`/`u32` little-endian, `bool` as one
//! byte, strings as a `u32` length prefix followed by UTF-8 bytes. Field
//! order is fixed by struct position, see [`crate::state`].

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::CodecError;

/// Scratch capacity for one encoded record or instruction payload.
pub const MAX_RECORD_LEN: usize = 1000;

/// Smallest buffer either layout can decode from: the leading byte, three
/// empty string prefixes, the rating and the two `u32` amounts.
pub const MIN_ENCODED_LEN: usize = 1 + 4 + 1 + 4 + 4 + 4 + 4;

/// A value with a fixed wire layout.
pub trait WireLayout: BorshSerialize + Sized {
    /// Bytes [`encode_into`] writes for this value.
    fn encoded_len(&self) -> usize;

    /// Decodes from the front of `input`, returning the value and the span
    /// consumed. Trailing bytes are left alone.
    fn decode(input: &[u8]) -> Result<(Self, usize), CodecError>;
}

/// Encodes `value` into `buf` and returns the span used.
///
/// Nothing is truncated: a value that does not fit fails with
/// [`CodecError::TruncatedBuffer`]. The buffer is never shrunk, callers slice
/// `&buf[..span]` before transmitting.
pub fn encode_into<T: WireLayout>(value: &T, buf: &mut [u8]) -> Result<usize, CodecError> {
    let required = value.encoded_len();
    let capacity = buf.len();
    if required > capacity {
        return Err(CodecError::TruncatedBuffer { required, capacity });
    }

    let mut cursor: &mut [u8] = buf;
    value
        .serialize(&mut cursor)
        .map_err(|_| CodecError::TruncatedBuffer { required, capacity })?;

    let span = capacity - cursor.len();
    debug_assert_eq!(span, required);
    Ok(span)
}

/// Encodes through a [`MAX_RECORD_LEN`] scratch buffer and keeps only the span.
pub fn encode_to_vec<T: WireLayout>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut scratch = [0u8; MAX_RECORD_LEN];
    let span = encode_into(value, &mut scratch)?;
    Ok(scratch[..span].to_vec())
}

pub(crate) fn check_min_len(input: &[u8]) -> Result<(), CodecError> {
    if input.len() < MIN_ENCODED_LEN {
        return Err(CodecError::TruncatedBuffer {
            required: MIN_ENCODED_LEN,
            capacity: input.len(),
        });
    }
    Ok(())
}

/// Borsh-decodes a prefix of `input` and reports how far it read.
pub(crate) fn decode_prefix<T: BorshDeserialize>(input: &[u8]) -> Result<(T, usize), CodecError> {
    let mut cursor = input;
    let value =
        T::deserialize(&mut cursor).map_err(|e| CodecError::MalformedRecord(e.to_string()))?;
    Ok((value, input.len() - cursor.len()))
}

pub(crate) fn str_len(s: &str) -> usize {
    4 + s.len()
}
