//! Conversions between raw byte sequences and integers, text and identifiers.
//!
//! Multi-byte integers are always big-endian. The slice based converters
//! accept 1 to 8 bytes and reject anything else instead of truncating.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Widest input the integer converters accept.
pub const MAX_INT_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("cannot convert an empty byte sequence to an integer")]
    Empty,
    #[error("{len} bytes do not fit in a {max}-byte integer")]
    TooWide { len: usize, max: usize },
    #[error("identifier must be exactly 16 bytes, got {len}")]
    InvalidIdentifier { len: usize },
}

fn check_width(bytes: &[u8]) -> Result<(), CodecError> {
    match bytes.len() {
        0 => Err(CodecError::Empty),
        len if len > MAX_INT_BYTES => Err(CodecError::TooWide {
            len,
            max: MAX_INT_BYTES,
        }),
        _ => Ok(()),
    }
}

fn fold_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

fn sign_extend(raw: u64, width: usize) -> i64 {
    let shift = 64 - 8 * width as u32;
    ((raw << shift) as i64) >> shift
}

/// Big-endian magnitude without a sign bit.
pub fn bytes_to_unsigned(bytes: &[u8]) -> Result<u64, CodecError> {
    check_width(bytes)?;
    Ok(fold_be(bytes))
}

/// Big-endian two's complement, sign-extended from the input's own width.
///
/// `[0xFF, 0x38]` is -200 and `[0x00, 0xC8]` is 200.
pub fn bytes_to_signed(bytes: &[u8]) -> Result<i64, CodecError> {
    check_width(bytes)?;
    Ok(sign_extend(fold_be(bytes), bytes.len()))
}

/// Fixed-width form of [`bytes_to_unsigned`].
pub fn unsigned_from_be<const N: usize>(bytes: [u8; N]) -> u64 {
    const { assert!(N >= 1 && N <= MAX_INT_BYTES) };
    fold_be(&bytes)
}

/// Fixed-width form of [`bytes_to_signed`].
pub fn signed_from_be<const N: usize>(bytes: [u8; N]) -> i64 {
    const { assert!(N >= 1 && N <= MAX_INT_BYTES) };
    sign_extend(fold_be(&bytes), N)
}

/// Renders every byte as two lowercase hex digits followed by `:`.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        // writing into a String cannot fail
        let _ = write!(out, "{b:02x}:");
    }
    out
}

/// Maps each byte to the code point of the same value.
pub fn bytes_to_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// 16-byte broadcast identifier.
///
/// The sensor boards put printable ASCII in here (`EPSG-GTI-PROY-3A`), so
/// besides the usual hex form the identifier converts to and from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconUuid(pub [u8; 16]);

impl BeaconUuid {
    pub fn from_text(text: &str) -> Result<Self, CodecError> {
        let bytes: [u8; 16] = text
            .as_bytes()
            .try_into()
            .map_err(|_| CodecError::InvalidIdentifier { len: text.len() })?;
        Ok(Self(bytes))
    }

    pub fn from_halves(most_significant: u64, least_significant: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&most_significant.to_be_bytes());
        bytes[8..].copy_from_slice(&least_significant.to_be_bytes());
        Self(bytes)
    }

    /// Most and least significant halves, each read big-endian.
    pub fn halves(&self) -> (u64, u64) {
        let (hi, lo) = self.0.split_at(8);
        (fold_be(hi), fold_be(lo))
    }

    pub fn to_text(&self) -> String {
        bytes_to_latin1(&self.0)
    }

    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }
}

impl fmt::Display for BeaconUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
