//! RPC client trait and submission options.
//!
//! The RPC client is an external collaborator; the bridges only need the
//! three calls below, each independently awaited.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::transaction::{Keypair, Signature};
use crate::wire::WireTransaction;

// =============================================================================
// Commitment
// =============================================================================

/// Confirmation depth for blockhash queries and submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Observed by the node.
    Processed,
    /// Voted on by a supermajority.
    Confirmed,
    /// Rooted and irreversible.
    Finalized,
}

// =============================================================================
// Blockhash info
// =============================================================================

/// A fresh lifetime anchor fetched from the RPC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashInfo {
    /// The anchoring blockhash.
    pub blockhash: [u8; 32],
    /// Last block height at which the anchor is valid.
    pub last_valid_block_height: u64,
}

// =============================================================================
// Options
// =============================================================================

/// Submission options forwarded to devices and the RPC layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Commitment to confirm the transaction at, if the caller wants the
    /// submission awaited.
    pub commitment: Option<Commitment>,
    /// Commitment for the preflight simulation.
    pub preflight_commitment: Option<Commitment>,
    /// Skip the preflight simulation entirely.
    pub skip_preflight: bool,
    /// Maximum resubmission attempts.
    pub max_retries: Option<u32>,
    /// Minimum slot the serving node must have reached.
    pub min_context_slot: Option<u64>,
}

/// Caller-facing options for `send_transaction`, including co-signers.
#[derive(Debug, Clone, Default)]
pub struct SendTransactionOptions {
    /// Commitment for the preflight simulation.
    pub preflight_commitment: Option<Commitment>,
    /// Skip the preflight simulation entirely.
    pub skip_preflight: bool,
    /// Maximum resubmission attempts.
    pub max_retries: Option<u32>,
    /// Minimum slot the serving node must have reached.
    pub min_context_slot: Option<u64>,
    /// Additional keypairs to co-sign with before submission.
    pub signers: Vec<Keypair>,
}

impl SendTransactionOptions {
    /// The device- and RPC-facing subset (signers never leave the bridge).
    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            commitment: None,
            preflight_commitment: self.preflight_commitment,
            skip_preflight: self.skip_preflight,
            max_retries: self.max_retries,
            min_context_slot: self.min_context_slot,
        }
    }
}

// =============================================================================
// RPC Client
// =============================================================================

/// External RPC collaborator.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Fetches a fresh lifetime anchor.
    async fn get_latest_blockhash(
        &self,
        commitment: Option<Commitment>,
        min_context_slot: Option<u64>,
    ) -> BridgeResult<BlockhashInfo>;

    /// Submits a signed wire transaction, returning its signature.
    async fn send_transaction(
        &self,
        transaction: WireTransaction,
        options: &SubmitOptions,
    ) -> BridgeResult<Signature>;

    /// Fetches confirmation details for a submitted transaction, if any.
    async fn get_transaction(
        &self,
        signature: &Signature,
        commitment: Option<Commitment>,
    ) -> BridgeResult<Option<serde_json::Value>>;
}

/// A shared RPC client trait object.
pub type BoxedRpcClient = Arc<dyn RpcClient>;
