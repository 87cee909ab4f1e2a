//! Wire-text encoding of serialized transactions.
//!
//! A [`WireTransaction`] is base64 text of the binary-serialized transaction.
//! Two conversions exist and they are not the same thing:
//!
//! - [`encode`](WireTransaction::encode) / [`decode`](WireTransaction::decode)
//!   move between the text and the binary [`Transaction`] — a real base64
//!   codec.
//! - [`to_device_bytes`](WireTransaction::to_device_bytes) /
//!   [`from_device_bytes`](WireTransaction::from_device_bytes) are the 1:1
//!   character-code mapping used on the device boundary, where the peer
//!   already holds the text reinterpreted as bytes. No base64 decode happens
//!   there.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{CodecError, CodecResult};
use crate::transaction::Transaction;

/// Base64 text of a binary-serialized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireTransaction(String);

impl WireTransaction {
    /// Encodes a transaction into its wire text.
    pub fn encode(transaction: &Transaction) -> Self {
        Self(STANDARD.encode(transaction.serialize()))
    }

    /// Decodes the wire text back into a transaction.
    pub fn decode(&self) -> CodecResult<Transaction> {
        let bytes = STANDARD
            .decode(&self.0)
            .map_err(|e| CodecError::Serialization(format!("base64 decode failed: {e}")))?;
        Transaction::deserialize(&bytes)
    }

    /// Wraps existing base64 text without re-encoding.
    pub fn from_base64(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The device-boundary byte view: each character's code point, 1:1.
    pub fn to_device_bytes(&self) -> Vec<u8> {
        self.0.chars().map(|c| c as u8).collect()
    }

    /// Rebuilds the wire text from the device-boundary byte view.
    pub fn from_device_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|&b| b as char).collect())
    }

    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WireTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
