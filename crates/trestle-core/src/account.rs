//! Accounts, addresses, and chain identifiers.
//!
//! An address is base58 text of a raw 32-byte identity — no hashing step, the
//! identity bytes ARE the address bytes. Accounts are immutable values: when
//! a device switches accounts it exposes a replacement, it never mutates the
//! one a bridge already holds.

use std::fmt;
use std::str::FromStr;

use crate::capability::Capability;
use crate::error::{CodecError, CodecResult};

// =============================================================================
// Address
// =============================================================================

/// Validated base58 text of a 32-byte identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    text: String,
    bytes: [u8; 32],
}

impl Address {
    /// Parses base58 text, requiring exactly 32 decoded bytes.
    pub fn parse(text: &str) -> CodecResult<Self> {
        let decoded = bs58::decode(text)
            .into_vec()
            .map_err(|e| CodecError::InvalidAddress(format!("base58 decode failed: {e}")))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
            CodecError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self {
            text: text.to_string(),
            bytes,
        })
    }

    /// Encodes raw identity bytes as an address.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            text: bs58::encode(bytes).into_string(),
            bytes: *bytes,
        }
    }

    /// The base58 text form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The raw 32-byte form.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Chain Identifier
// =============================================================================

/// Opaque chain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId(String);

impl ChainId {
    /// Creates a chain identifier from its text form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The main production chain.
    pub fn mainnet() -> Self {
        Self::new("mainnet")
    }

    /// The development chain.
    pub fn devnet() -> Self {
        Self::new("devnet")
    }

    /// The test chain.
    pub fn testnet() -> Self {
        Self::new("testnet")
    }

    /// A locally hosted chain.
    pub fn localnet() -> Self {
        Self::new("localnet")
    }

    /// The text form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Account
// =============================================================================

/// Identity bound to a device.
///
/// The address is carried as opaque text; bridges that need the identity
/// bytes parse it (and report a public-key error when that fails).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    address: String,
    public_key: Vec<u8>,
    capabilities: Vec<Capability>,
    chains: Vec<ChainId>,
}

impl Account {
    /// Creates an account value.
    pub fn new(
        address: impl Into<String>,
        public_key: impl Into<Vec<u8>>,
        capabilities: Vec<Capability>,
        chains: Vec<ChainId>,
    ) -> Self {
        Self {
            address: address.into(),
            public_key: public_key.into(),
            capabilities,
            chains,
        }
    }

    /// The opaque address text.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The raw public-key bytes.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Capability tags this account supports.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Chains this account is valid on.
    pub fn chains(&self) -> &[ChainId] {
        &self.chains
    }

    /// Whether the account supports `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
