//! SHA-256 hash type used for blocks, transactions, and Merkle nodes.
//!
//! Hashes travel on the wire as lowercase 64-character hex strings; the
//! encoding is part of the protocol — every node must produce byte-identical
//! serializations for `calculate_hash` to agree across the network.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash256([u8; 32]);

#[derive(Debug, Error)]
pub enum HashParseError {
    #[error("expected 64 hex characters, got {0}")]
    BadLength(usize),

    #[error("invalid hex character {0:?}")]
    BadCharacter(char),
}

impl Hash256 {
    /// The all-zero hash — the `previous_hash` sentinel of a genesis block.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lowercase hex representation (64 characters).
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            s.push(HEX_DIGITS[(b >> 4) as usize] as char);
            s.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
        }
        s
    }

    /// Count of leading `'0'` hex digits — the proof-of-work measure.
    pub fn leading_zero_digits(&self) -> u8 {
        let mut count = 0u8;
        for b in &self.0 {
            if *b == 0 {
                count += 2;
                continue;
            }
            if *b >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn hex_val(b: u8) -> Result<u8, HashParseError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        other => Err(HashParseError::BadCharacter(other as char)),
    }
}

impl FromStr for Hash256 {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.as_bytes();
        if raw.len() != 64 {
            return Err(HashParseError::BadLength(raw.len()));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_val(raw[2 * i])?;
            let lo = hex_val(raw[2 * i + 1])?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
