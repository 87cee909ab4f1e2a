//! The device trait: a capability-advertising signer.
//!
//! A device owns its accounts and capability list and may change either at
//! runtime; bridges hold a non-owning reference plus a [`Subscription`] for
//! change notifications. Operations a device does not advertise keep their
//! default bodies, which report a configuration error — so a partial device
//! implements only what it advertises.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::account::{Account, ChainId};
use crate::capability::{Capability, CapabilityList};
use crate::error::{BridgeError, BridgeResult};
use crate::event::Subscription;
use crate::rpc::SubmitOptions;

// =============================================================================
// Ready State
// =============================================================================

/// Readiness reported by devices and adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// The environment can never host this device.
    Unsupported,
    /// Not found in the environment.
    NotDetected,
    /// Not present yet, but can be brought up on demand.
    Loadable,
    /// Present and usable.
    Installed,
}

impl ReadyState {
    /// Whether operations may be attempted in this state.
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Loadable | Self::Installed)
    }
}

// =============================================================================
// Change Notification
// =============================================================================

/// Partial change notification. A `None` field means "unchanged", not
/// "cleared".
#[derive(Debug, Clone, Default)]
pub struct DeviceChange {
    /// Updated account list, if the accounts changed.
    pub accounts: Option<Vec<Account>>,
    /// Updated capability list, if the capabilities changed.
    pub capabilities: Option<CapabilityList>,
}

/// Listener for device change notifications.
pub type ChangeListener = Arc<dyn Fn(&DeviceChange) + Send + Sync>;

// =============================================================================
// Request / Output Payloads
// =============================================================================

/// One sign-transaction request.
#[derive(Debug, Clone)]
pub struct SignTransactionRequest {
    /// The account expected to sign.
    pub account: Account,
    /// The chain the transaction targets, when the caller pins one.
    pub chain: Option<ChainId>,
    /// Wire transaction in its device-boundary byte view.
    pub transaction: Vec<u8>,
    /// Submission options, for devices that preflight while signing.
    pub options: SubmitOptions,
}

/// A signed transaction in its device-boundary byte view.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// Wire bytes of the signed transaction.
    pub transaction: Vec<u8>,
}

/// One combined sign-and-submit request.
#[derive(Debug, Clone)]
pub struct SignAndSendRequest {
    /// The account expected to sign.
    pub account: Account,
    /// The chain to submit on.
    pub chain: ChainId,
    /// Wire transaction in its device-boundary byte view.
    pub transaction: Vec<u8>,
    /// Submission options.
    pub options: SubmitOptions,
}

/// Output of a combined sign-and-submit.
#[derive(Debug, Clone)]
pub struct SignAndSendOutput {
    /// Raw 64-byte transaction signature.
    pub signature: Vec<u8>,
}

/// One message-signing request.
#[derive(Debug, Clone)]
pub struct SignMessageRequest {
    /// The account expected to sign.
    pub account: Account,
    /// The bytes to sign.
    pub message: Vec<u8>,
}

/// Output of a message signing.
#[derive(Debug, Clone)]
pub struct SignMessageOutput {
    /// The bytes that were signed.
    pub signed_message: Vec<u8>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

/// Sign-in request fields. All optional; the device fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInInput {
    /// Domain requesting the sign-in.
    pub domain: Option<String>,
    /// Address expected to sign in.
    pub address: Option<String>,
    /// Human-readable statement to sign.
    pub statement: Option<String>,
    /// Anti-replay nonce.
    pub nonce: Option<String>,
}

/// Output of a sign-in: the account binding plus the signed statement.
#[derive(Debug, Clone)]
pub struct SignInOutput {
    /// The account that signed in.
    pub account: Account,
    /// The statement bytes that were signed.
    pub signed_message: Vec<u8>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

// =============================================================================
// Device Trait
// =============================================================================

/// A capability-advertising signer device.
#[async_trait]
pub trait Device: Send + Sync {
    /// Human-readable device name. Also the default dedup identity for
    /// registration.
    fn name(&self) -> String;

    /// Icon reference, if the device carries one.
    fn icon(&self) -> String {
        String::new()
    }

    /// Chains the device can operate on.
    fn chains(&self) -> Vec<ChainId>;

    /// Current readiness.
    fn ready_state(&self) -> ReadyState {
        ReadyState::Installed
    }

    /// The currently advertised capability list. May change at runtime;
    /// changes are announced through [`subscribe`](Device::subscribe).
    fn capabilities(&self) -> CapabilityList;

    /// Currently exposed accounts, first one active.
    fn accounts(&self) -> Vec<Account>;

    /// Establishes a session. `silent` requests a prompt-free attempt.
    async fn connect(&self, silent: bool) -> BridgeResult<Vec<Account>>;

    /// Tears the session down on the device side.
    async fn disconnect(&self) -> BridgeResult<()> {
        Err(BridgeError::Config {
            capability: Capability::Disconnect,
        })
    }

    /// Signs each transaction, returning the signed wire bytes in input
    /// order.
    async fn sign_transaction(
        &self,
        requests: Vec<SignTransactionRequest>,
    ) -> BridgeResult<Vec<SignedTransaction>> {
        let _ = requests;
        Err(BridgeError::Config {
            capability: Capability::SignTransaction,
        })
    }

    /// Signs and submits each transaction, returning signatures in input
    /// order.
    async fn sign_and_send_transaction(
        &self,
        requests: Vec<SignAndSendRequest>,
    ) -> BridgeResult<Vec<SignAndSendOutput>> {
        let _ = requests;
        Err(BridgeError::Config {
            capability: Capability::SignAndSendTransaction,
        })
    }

    /// Signs each message, returning outputs in input order.
    async fn sign_message(
        &self,
        requests: Vec<SignMessageRequest>,
    ) -> BridgeResult<Vec<SignMessageOutput>> {
        let _ = requests;
        Err(BridgeError::Config {
            capability: Capability::SignMessage,
        })
    }

    /// Performs each sign-in, returning outputs in input order.
    async fn sign_in(&self, inputs: Vec<SignInInput>) -> BridgeResult<Vec<SignInOutput>> {
        let _ = inputs;
        Err(BridgeError::Config {
            capability: Capability::SignIn,
        })
    }

    /// Registers a change listener. Dropping the returned subscription
    /// detaches it.
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

/// A shared device trait object.
pub type BoxedDevice = Arc<dyn Device>;
