//! The adapter trait: a fixed lifecycle-operation surface over a signer.
//!
//! Where a [`Device`](crate::device::Device) advertises an open-ended
//! capability list, an adapter exposes a fixed set of operations and a
//! [`CapabilitySet`] describing which of the optional ones are currently
//! bound. Callers probe the set's discriminants instead of calling and
//! catching: an unbound operation is observably absent.

use std::sync::Arc;

use async_trait::async_trait;

use crate::account::Address;
use crate::capability::{Capability, CapabilitySet};
use crate::device::{ReadyState, SignInInput, SignInOutput};
use crate::error::{BridgeError, BridgeResult};
use crate::event::{AdapterEvent, EventEmitter};
use crate::rpc::{RpcClient, SendTransactionOptions};
use crate::transaction::{Signature, Transaction, TransactionMessage, TransactionVersion};

/// A fixed lifecycle-operation surface over a signer.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Human-readable adapter name.
    fn name(&self) -> String;

    /// Icon reference, if the adapter carries one.
    fn icon(&self) -> String {
        String::new()
    }

    /// Address of the active account, when connected.
    fn address(&self) -> Option<Address>;

    /// Current readiness.
    fn ready_state(&self) -> ReadyState;

    /// Whether an account is bound.
    fn connected(&self) -> bool {
        self.address().is_some()
    }

    /// Transaction versions the adapter accepts.
    fn supported_transaction_versions(&self) -> Vec<TransactionVersion> {
        vec![TransactionVersion::Legacy]
    }

    /// The probing surface: which optional operations are bound right now.
    fn capabilities(&self) -> CapabilitySet;

    /// The adapter's event stream.
    fn events(&self) -> &EventEmitter<AdapterEvent>;

    /// Establishes a session and binds the first exposed account.
    async fn connect(&self) -> BridgeResult<()>;

    /// Prompt-free connect attempt. Defaults to a regular connect.
    async fn auto_connect(&self) -> BridgeResult<()> {
        self.connect().await
    }

    /// Clears the account binding. Never fails: device-side trouble is
    /// reported through the event stream instead.
    async fn disconnect(&self) -> BridgeResult<()>;

    /// Compiles, co-signs, and submits a transaction, returning its
    /// signature.
    async fn send_transaction(
        &self,
        message: TransactionMessage,
        rpc: &dyn RpcClient,
        options: SendTransactionOptions,
    ) -> BridgeResult<Signature>;

    /// Signs one transaction, returning the compiled form with its
    /// signature slots filled in.
    async fn sign_transaction(&self, message: TransactionMessage) -> BridgeResult<Transaction> {
        let _ = message;
        Err(BridgeError::Config {
            capability: Capability::SignTransaction,
        })
    }

    /// Signs a batch of transactions strictly serially, in input order.
    ///
    /// A failure aborts the remaining inputs and propagates.
    async fn sign_all_transactions(
        &self,
        messages: Vec<TransactionMessage>,
    ) -> BridgeResult<Vec<Transaction>> {
        let mut signed = Vec::with_capacity(messages.len());
        for message in messages {
            signed.push(self.sign_transaction(message).await?);
        }
        Ok(signed)
    }

    /// Signs arbitrary bytes, returning the raw signature.
    async fn sign_message(&self, message: &[u8]) -> BridgeResult<Vec<u8>> {
        let _ = message;
        Err(BridgeError::Config {
            capability: Capability::SignMessage,
        })
    }

    /// Signs an authentication statement and binds the resulting account.
    async fn sign_in(&self, input: SignInInput) -> BridgeResult<SignInOutput> {
        let _ = input;
        Err(BridgeError::Config {
            capability: Capability::SignIn,
        })
    }
}

/// A shared adapter trait object.
pub type BoxedAdapter = Arc<dyn Adapter>;
