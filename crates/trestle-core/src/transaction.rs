//! Transaction model and binary wire codec.
//!
//! Two interchangeable forms exist: the structured [`TransactionMessage`]
//! callers build and inspect, and the compiled [`Transaction`] with its
//! canonical account table and signature slots. The binary layout uses
//! compact-u16 length prefixes:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     version prefix        0x80 (v0 only; absent for legacy)
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (program index, account indices, data)
//!     table_lookups         compact-u16, always 0 (v0 only)
//! ```

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::Signer as _;

use crate::account::Address;
use crate::error::{CodecError, CodecResult};

// =============================================================================
// Transaction Version
// =============================================================================

/// Wire version of a transaction message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionVersion {
    /// Unversioned message layout.
    Legacy,
    /// Versioned layout with the 0x80 prefix byte.
    V0,
}

impl fmt::Display for TransactionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::V0 => f.write_str("0"),
        }
    }
}

impl FromStr for TransactionVersion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "0" => Ok(Self::V0),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Compact-u16 encoding
// =============================================================================

/// Encodes a `u16` in the compact-u16 format (1-3 bytes, 7 bits per byte,
/// high bit as continuation flag).
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decodes a compact-u16 value, returning `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> CodecResult<(u16, usize)> {
    let mut value: u32 = 0;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let Some(&byte) = data.get(consumed) else {
            return Err(CodecError::Serialization(
                "unexpected end of data while decoding compact-u16".into(),
            ));
        };
        consumed += 1;

        value |= ((byte & 0x7f) as u32) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            break;
        }
        if consumed >= 3 {
            break;
        }
    }

    if value > u16::MAX as u32 {
        return Err(CodecError::Serialization("compact-u16 value overflow".into()));
    }

    Ok((value as u16, consumed))
}

// =============================================================================
// Structured Message
// =============================================================================

/// A single account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    /// The referenced account.
    pub address: Address,
    /// Whether the account must sign the transaction.
    pub is_signer: bool,
    /// Whether the instruction may write to the account.
    pub is_writable: bool,
}

/// An instruction before compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The program to invoke.
    pub program_id: Address,
    /// Accounts the instruction reads or writes.
    pub accounts: Vec<AccountMeta>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// The blockhash/expiry binding that determines how long a signed
/// transaction remains valid for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeAnchor {
    /// The recent blockhash the transaction is anchored to.
    pub blockhash: [u8; 32],
    /// Last block height at which the anchor is still valid, when known.
    /// Not part of the wire layout, so a decompiled message carries `None`.
    pub last_valid_block_height: Option<u64>,
}

/// Structured, not-yet-compiled transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMessage {
    /// Wire version to compile to.
    pub version: TransactionVersion,
    /// The fee payer; always the first signer.
    pub fee_payer: Address,
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
    /// Lifetime anchor; required before the message can be compiled.
    pub lifetime: Option<LifetimeAnchor>,
}

impl TransactionMessage {
    /// Compiles the message into its canonical transaction form.
    ///
    /// Account ordering: writable signers (fee payer first), read-only
    /// signers, writable non-signers, read-only non-signers. Duplicate
    /// references are merged with permission bits OR-ed together.
    pub fn compile(&self) -> CodecResult<Transaction> {
        let lifetime = self.lifetime.as_ref().ok_or_else(|| {
            CodecError::Build("transaction message has no lifetime anchor".into())
        })?;

        struct Entry {
            key: [u8; 32],
            is_signer: bool,
            is_writable: bool,
        }

        let mut entries: Vec<Entry> = Vec::new();
        let mut upsert = |key: [u8; 32], signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.key == key) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(Entry {
                    key,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        upsert(self.fee_payer.to_bytes(), true, true);
        for instruction in &self.instructions {
            for meta in &instruction.accounts {
                upsert(meta.address.to_bytes(), meta.is_signer, meta.is_writable);
            }
            // Program IDs are non-signer, read-only accounts.
            upsert(instruction.program_id.to_bytes(), false, false);
        }

        // Stable sort keeps insertion order within each permission class, so
        // the fee payer stays first among the writable signers.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if entries.len() > u8::MAX as usize {
            return Err(CodecError::Build(format!(
                "too many accounts: {}",
                entries.len()
            )));
        }

        let num_required_signatures = entries.iter().filter(|e| e.is_signer).count() as u8;
        let num_readonly_signed = entries
            .iter()
            .filter(|e| e.is_signer && !e.is_writable)
            .count() as u8;
        let num_readonly_unsigned = entries
            .iter()
            .filter(|e| !e.is_signer && !e.is_writable)
            .count() as u8;

        let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.key).collect();

        let mut instructions = Vec::with_capacity(self.instructions.len());
        for instruction in &self.instructions {
            let program_id_index = position_of(&account_keys, &instruction.program_id.to_bytes())
                .ok_or_else(|| CodecError::Build("program id not in account keys".into()))?;

            let mut account_indices = Vec::with_capacity(instruction.accounts.len());
            for meta in &instruction.accounts {
                let index = position_of(&account_keys, &meta.address.to_bytes())
                    .ok_or_else(|| CodecError::Build("account not in account keys".into()))?;
                account_indices.push(index);
            }

            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data: instruction.data.clone(),
            });
        }

        Ok(Transaction {
            version: self.version,
            account_keys,
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            recent_blockhash: lifetime.blockhash,
            instructions,
            signatures: vec![[0u8; 64]; num_required_signatures as usize],
        })
    }
}

fn position_of(keys: &[[u8; 32]], key: &[u8; 32]) -> Option<u8> {
    keys.iter().position(|k| k == key).map(|p| p as u8)
}

// =============================================================================
// Compiled Transaction
// =============================================================================

/// An instruction with account references replaced by table indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index into the account table for the program to invoke.
    pub program_id_index: u8,
    /// Indices into the account table for each referenced account.
    pub account_indices: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// A compiled transaction with one signature slot per required signer.
/// Slots are zeroed until signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Wire version of the message.
    pub version: TransactionVersion,
    /// All referenced account keys in canonical order.
    pub account_keys: Vec<[u8; 32]>,
    /// Number of required signatures; the first N accounts are the signers.
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,
    /// The anchoring blockhash.
    pub recent_blockhash: [u8; 32],
    /// Compiled instructions.
    pub instructions: Vec<CompiledInstruction>,
    /// Signature slots, one per required signer.
    pub signatures: Vec<[u8; 64]>,
}

impl Transaction {
    /// Serializes the message portion (the bytes that get signed).
    pub fn serialize_message(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        if self.version == TransactionVersion::V0 {
            buf.push(0x80);
        }

        buf.push(self.num_required_signatures);
        buf.push(self.num_readonly_signed);
        buf.push(self.num_readonly_unsigned);

        buf.extend_from_slice(&encode_compact_u16(self.account_keys.len() as u16));
        for key in &self.account_keys {
            buf.extend_from_slice(key);
        }

        buf.extend_from_slice(&self.recent_blockhash);

        buf.extend_from_slice(&encode_compact_u16(self.instructions.len() as u16));
        for instruction in &self.instructions {
            buf.push(instruction.program_id_index);
            buf.extend_from_slice(&encode_compact_u16(instruction.account_indices.len() as u16));
            buf.extend_from_slice(&instruction.account_indices);
            buf.extend_from_slice(&encode_compact_u16(instruction.data.len() as u16));
            buf.extend_from_slice(&instruction.data);
        }

        if self.version == TransactionVersion::V0 {
            // Address-table lookups are never produced.
            buf.extend_from_slice(&encode_compact_u16(0));
        }

        buf
    }

    /// Serializes the full transaction (signature slots + message).
    pub fn serialize(&self) -> Vec<u8> {
        let message = self.serialize_message();
        let mut wire = Vec::with_capacity(3 + 64 * self.signatures.len() + message.len());
        wire.extend_from_slice(&encode_compact_u16(self.signatures.len() as u16));
        for signature in &self.signatures {
            wire.extend_from_slice(signature);
        }
        wire.extend_from_slice(&message);
        wire
    }

    /// Parses a binary-serialized transaction.
    pub fn deserialize(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = Reader::new(bytes);

        let num_signatures = reader.read_compact_u16()? as usize;
        let mut signatures = Vec::with_capacity(num_signatures);
        for _ in 0..num_signatures {
            signatures.push(reader.read_array::<64>()?);
        }

        let version = if reader.peek()? & 0x80 != 0 {
            let prefix = reader.read_u8()?;
            if prefix & 0x7f != 0 {
                return Err(CodecError::Serialization(format!(
                    "unsupported transaction version {}",
                    prefix & 0x7f
                )));
            }
            TransactionVersion::V0
        } else {
            TransactionVersion::Legacy
        };

        let num_required_signatures = reader.read_u8()?;
        let num_readonly_signed = reader.read_u8()?;
        let num_readonly_unsigned = reader.read_u8()?;

        let num_accounts = reader.read_compact_u16()? as usize;
        let mut account_keys = Vec::with_capacity(num_accounts);
        for _ in 0..num_accounts {
            account_keys.push(reader.read_array::<32>()?);
        }

        let recent_blockhash = reader.read_array::<32>()?;

        let num_instructions = reader.read_compact_u16()? as usize;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_id_index = reader.read_u8()?;
            let num_indices = reader.read_compact_u16()? as usize;
            let account_indices = reader.read_vec(num_indices)?;
            let data_len = reader.read_compact_u16()? as usize;
            let data = reader.read_vec(data_len)?;
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data,
            });
        }

        if version == TransactionVersion::V0 {
            let table_lookups = reader.read_compact_u16()?;
            if table_lookups != 0 {
                return Err(CodecError::Serialization(
                    "address-table lookups are not supported".into(),
                ));
            }
        }

        Ok(Self {
            version,
            account_keys,
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            recent_blockhash,
            instructions,
            signatures,
        })
    }

    /// Rebuilds the structured message from the compiled form.
    ///
    /// The recovered lifetime anchor carries the blockhash only; signature
    /// slots do not survive (they belong to the compiled form).
    pub fn decompile(&self) -> CodecResult<TransactionMessage> {
        let fee_payer = self
            .account_keys
            .first()
            .map(Address::from_bytes)
            .ok_or_else(|| CodecError::Build("transaction has no accounts".into()))?;

        let mut instructions = Vec::with_capacity(self.instructions.len());
        for compiled in &self.instructions {
            let program_id = Address::from_bytes(&self.key_at(compiled.program_id_index)?);

            let mut accounts = Vec::with_capacity(compiled.account_indices.len());
            for &index in &compiled.account_indices {
                let address = Address::from_bytes(&self.key_at(index)?);
                accounts.push(AccountMeta {
                    address,
                    is_signer: self.is_signer_index(index as usize),
                    is_writable: self.is_writable_index(index as usize),
                });
            }

            instructions.push(Instruction {
                program_id,
                accounts,
                data: compiled.data.clone(),
            });
        }

        Ok(TransactionMessage {
            version: self.version,
            fee_payer,
            instructions,
            lifetime: Some(LifetimeAnchor {
                blockhash: self.recent_blockhash,
                last_valid_block_height: None,
            }),
        })
    }

    /// The ordered signer identities (the first N account keys).
    pub fn signer_addresses(&self) -> Vec<Address> {
        self.account_keys
            .iter()
            .take(self.num_required_signatures as usize)
            .map(Address::from_bytes)
            .collect()
    }

    /// Fills signature slots for the given keypairs.
    ///
    /// Every keypair must correspond to a required signer; remaining slots
    /// are left untouched.
    pub fn partially_sign(&mut self, signers: &[Keypair]) -> CodecResult<()> {
        let message = self.serialize_message();
        for keypair in signers {
            let pubkey = keypair.public_key();
            let slot = self
                .account_keys
                .iter()
                .take(self.num_required_signatures as usize)
                .position(|k| *k == pubkey)
                .ok_or_else(|| {
                    CodecError::Signing(format!(
                        "signer {} is not a required signer",
                        keypair.address()
                    ))
                })?;
            if slot >= self.signatures.len() {
                return Err(CodecError::Signing(format!(
                    "no signature slot for signer {}",
                    keypair.address()
                )));
            }
            self.signatures[slot] = keypair.sign(&message);
        }
        Ok(())
    }

    /// Fills signature slots and requires the transaction to end up fully
    /// signed.
    pub fn sign(&mut self, signers: &[Keypair]) -> CodecResult<()> {
        self.partially_sign(signers)?;
        if !self.is_fully_signed() {
            return Err(CodecError::Signing("transaction is missing signatures".into()));
        }
        Ok(())
    }

    /// Whether every required signature slot is filled.
    pub fn is_fully_signed(&self) -> bool {
        self.signatures.len() == self.num_required_signatures as usize
            && self.signatures.iter().all(|s| s != &[0u8; 64])
    }

    /// The transaction signature (the fee payer's slot), if filled.
    pub fn signature(&self) -> Option<Signature> {
        self.signatures
            .first()
            .filter(|s| **s != [0u8; 64])
            .map(Signature::from_bytes)
    }

    fn key_at(&self, index: u8) -> CodecResult<[u8; 32]> {
        self.account_keys
            .get(index as usize)
            .copied()
            .ok_or_else(|| CodecError::Build(format!("account index {index} out of range")))
    }

    fn is_signer_index(&self, index: usize) -> bool {
        index < self.num_required_signatures as usize
    }

    fn is_writable_index(&self, index: usize) -> bool {
        let num_signers = self.num_required_signatures as usize;
        if index < num_signers {
            index < num_signers - self.num_readonly_signed as usize
        } else {
            index < self
                .account_keys
                .len()
                .saturating_sub(self.num_readonly_unsigned as usize)
        }
    }
}

// =============================================================================
// Keypair
// =============================================================================

/// Ed25519 keypair for caller-supplied co-signing.
pub struct Keypair {
    signing: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Builds a keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The public identity as an address.
    pub fn address(&self) -> Address {
        Address::from_bytes(&self.public_key())
    }

    /// The raw public-key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// Produces a detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing: ed25519_dalek::SigningKey::from_bytes(&self.signing.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Signature
// =============================================================================

/// Base58 text form of a 64-byte transaction signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    text: String,
    bytes: [u8; 64],
}

impl Signature {
    /// Parses base58 text, requiring exactly 64 decoded bytes.
    pub fn parse(text: &str) -> CodecResult<Self> {
        let decoded = bs58::decode(text)
            .into_vec()
            .map_err(|e| CodecError::InvalidSignature(format!("base58 decode failed: {e}")))?;
        Self::try_from_slice(&decoded).map(|mut sig| {
            sig.text = text.to_string();
            sig
        })
    }

    /// Encodes raw signature bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            text: bs58::encode(bytes).into_string(),
            bytes: *bytes,
        }
    }

    /// Converts a byte slice, requiring exactly 64 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> CodecResult<Self> {
        let bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            CodecError::InvalidSignature(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_bytes(&bytes))
    }

    /// The base58 text form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The raw 64-byte form.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.bytes
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Signature {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Internal reader
// =============================================================================

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek(&self) -> CodecResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| CodecError::Serialization("unexpected end of data".into()))
    }

    fn read_u8(&mut self) -> CodecResult<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_compact_u16(&mut self) -> CodecResult<u16> {
        let (value, consumed) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.read_vec(N)?;
        bytes
            .try_into()
            .map_err(|_| CodecError::Serialization("unexpected end of data".into()))
    }

    fn read_vec(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| CodecError::Serialization("unexpected end of data".into()))?;
        let out = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(out)
    }
}
