//! Capability model.
//!
//! Devices advertise what they can do as an ordered [`CapabilityList`]; each
//! entry names a [`Capability`] and, for transaction-taking operations, the
//! transaction versions it accepts. A bridge never calls through the list
//! directly — it derives a [`CapabilitySet`] from the list and the active
//! account, and consults the set's discriminants. The set is a pure function
//! of its inputs and is recomputed whenever the device reports a change, so
//! "is this operation bound right now" is always answerable without making a
//! call.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::account::Account;
use crate::transaction::TransactionVersion;

// =============================================================================
// Capability Tags
// =============================================================================

/// A named, independently advertised operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Establish a session and expose accounts.
    Connect,
    /// Tear the session down on the device side.
    Disconnect,
    /// Emit change notifications.
    Events,
    /// Sign a transaction and submit it in one step.
    SignAndSendTransaction,
    /// Sign a transaction and return it.
    SignTransaction,
    /// Sign an arbitrary byte message.
    SignMessage,
    /// Sign an authentication statement, producing an account binding.
    SignIn,
}

impl Capability {
    /// Stable string tag for this capability.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Events => "events",
            Self::SignAndSendTransaction => "sign-and-send-transaction",
            Self::SignTransaction => "sign-transaction",
            Self::SignMessage => "sign-message",
            Self::SignIn => "sign-in",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Capability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "events" => Self::Events,
            "sign-and-send-transaction" => Self::SignAndSendTransaction,
            "sign-transaction" => Self::SignTransaction,
            "sign-message" => Self::SignMessage,
            "sign-in" => Self::SignIn,
            _ => return Err(()),
        })
    }
}

// =============================================================================
// Capability List
// =============================================================================

/// One advertised capability with its declared transaction-version support.
///
/// `versions` is empty for operations that do not take transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEntry {
    /// The advertised capability.
    pub capability: Capability,
    /// Transaction versions the operation accepts.
    pub versions: Vec<TransactionVersion>,
}

/// Ordered capability listing advertised by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityList {
    entries: Vec<CapabilityEntry>,
}

impl CapabilityList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a capability without transaction-version support.
    pub fn with(mut self, capability: Capability) -> Self {
        self.entries.push(CapabilityEntry {
            capability,
            versions: Vec::new(),
        });
        self
    }

    /// Adds a capability with its declared transaction versions.
    pub fn with_versions(
        mut self,
        capability: Capability,
        versions: Vec<TransactionVersion>,
    ) -> Self {
        self.entries.push(CapabilityEntry {
            capability,
            versions,
        });
        self
    }

    /// Whether the list advertises `capability`.
    pub fn contains(&self, capability: Capability) -> bool {
        self.entries.iter().any(|e| e.capability == capability)
    }

    /// Declared transaction versions for `capability`; empty if absent.
    pub fn versions(&self, capability: Capability) -> &[TransactionVersion] {
        self.entries
            .iter()
            .find(|e| e.capability == capability)
            .map(|e| e.versions.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates the entries in advertisement order.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityEntry> {
        self.entries.iter()
    }

    /// Number of advertised capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Capability Set
// =============================================================================

/// Bound sign-transaction operation with its resolved version support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignTransactionCapability {
    /// Transaction versions the binding accepts.
    pub versions: Vec<TransactionVersion>,
}

/// Bound sign-message operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignMessageCapability;

/// Bound sign-in operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignInCapability;

/// The method bindings of a bridge, recomputed whenever the underlying
/// device reports a change.
///
/// A `None` binding means the operation is unbound: probing for it returns
/// false, it does not merely fail when called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    /// Resolved transaction versions for the device as a whole.
    pub transaction_versions: Vec<TransactionVersion>,
    /// Sign-transaction binding, if device and account both advertise it.
    pub sign_transaction: Option<SignTransactionCapability>,
    /// Sign-message binding, if device and account both advertise it.
    pub sign_message: Option<SignMessageCapability>,
    /// Sign-in binding, if the device advertises it.
    pub sign_in: Option<SignInCapability>,
}

impl CapabilitySet {
    /// Derives the bindings from a device capability list and the active
    /// account. Pure: same inputs, same set.
    pub fn derive(device: &CapabilityList, account: Option<&Account>) -> Self {
        let transaction_versions = resolve_versions(device);

        let account_has = |capability: Capability| {
            account.is_some_and(|a| a.supports(capability))
        };

        let sign_transaction = (device.contains(Capability::SignTransaction)
            && account_has(Capability::SignTransaction))
        .then(|| SignTransactionCapability {
            versions: non_empty_or_legacy(device.versions(Capability::SignTransaction)),
        });

        let sign_message = (device.contains(Capability::SignMessage)
            && account_has(Capability::SignMessage))
        .then_some(SignMessageCapability);

        // Sign-in produces the account binding, so it cannot require one.
        let sign_in = device
            .contains(Capability::SignIn)
            .then_some(SignInCapability);

        trace!(
            sign_transaction = sign_transaction.is_some(),
            sign_message = sign_message.is_some(),
            sign_in = sign_in.is_some(),
            "Capability set derived"
        );

        Self {
            transaction_versions,
            sign_transaction,
            sign_message,
            sign_in,
        }
    }
}

/// The sign-and-send entry's versions win when the device advertises it;
/// otherwise the sign-transaction entry's. An empty result means legacy only.
fn resolve_versions(device: &CapabilityList) -> Vec<TransactionVersion> {
    let versions = if device.contains(Capability::SignAndSendTransaction) {
        device.versions(Capability::SignAndSendTransaction)
    } else {
        device.versions(Capability::SignTransaction)
    };
    non_empty_or_legacy(versions)
}

fn non_empty_or_legacy(versions: &[TransactionVersion]) -> Vec<TransactionVersion> {
    if versions.is_empty() {
        vec![TransactionVersion::Legacy]
    } else {
        versions.to_vec()
    }
}
