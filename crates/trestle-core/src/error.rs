//! Unified error types for the Trestle bridges.
//!
//! Failures are split by layer: [`CodecError`] reports what went wrong with
//! bytes, [`BridgeError`] reports which lifecycle operation failed and why.
//! A codec failure crosses into the bridge layer as [`BridgeError::External`]
//! and is attributed to the failing operation at the public boundary via
//! [`BridgeError::or_wrap`].

use thiserror::Error;

use crate::capability::Capability;

// =============================================================================
// Bridge Errors
// =============================================================================

/// Errors surfaced by bridge lifecycle operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Operation attempted before the device reported itself usable.
    #[error("device is not ready")]
    NotReady,

    /// Operation requires an active account binding.
    #[error("not connected")]
    NotConnected,

    /// The device's connect call rejected.
    #[error("connection failed: {reason}")]
    Connection {
        /// Reason for failure.
        reason: String,
    },

    /// Expected account missing, or the account lacks a required capability.
    #[error("account error: {reason}")]
    Account {
        /// Reason for failure.
        reason: String,
    },

    /// The device itself lacks a required capability.
    #[error("device does not support '{capability}'")]
    Config {
        /// The missing capability.
        capability: Capability,
    },

    /// Returned address failed to parse as a valid identity.
    #[error("invalid public key: {reason}")]
    PublicKey {
        /// Reason for failure.
        reason: String,
    },

    /// Transaction signing failed.
    #[error("sign transaction failed: {reason}")]
    SignTransaction {
        /// Reason for failure.
        reason: String,
    },

    /// Message signing failed.
    #[error("sign message failed: {reason}")]
    SignMessage {
        /// Reason for failure.
        reason: String,
    },

    /// Sign-in failed.
    #[error("sign-in failed: {reason}")]
    SignIn {
        /// Reason for failure.
        reason: String,
    },

    /// Failure anywhere in the compile/sign/submit pipeline.
    #[error("send transaction failed: {reason}")]
    SendTransaction {
        /// Reason for failure.
        reason: String,
    },

    /// The device dropped its account outside an explicit disconnect call.
    #[error("device disconnected")]
    Disconnected,

    /// Failure during the disconnect call itself. Reported via event only;
    /// local disconnection always completes.
    #[error("disconnect failed: {reason}")]
    Disconnection {
        /// Reason for failure.
        reason: String,
    },

    /// Raw failure from a device, adapter, or RPC collaborator that has not
    /// been attributed to an operation yet.
    #[error("{reason}")]
    External {
        /// Reason for failure.
        reason: String,
    },
}

impl BridgeError {
    /// Creates an unattributed external failure.
    pub fn external(reason: impl Into<String>) -> Self {
        Self::External {
            reason: reason.into(),
        }
    }

    /// Creates an account error.
    pub fn account(reason: impl Into<String>) -> Self {
        Self::Account {
            reason: reason.into(),
        }
    }

    /// Whether this error already names a bridge failure kind.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::External { .. })
    }

    /// Attributes an unrecognized failure to an operation.
    ///
    /// Recognized kinds pass through untouched so that errors are never
    /// wrapped twice.
    pub fn or_wrap(self, wrap: impl FnOnce(String) -> BridgeError) -> BridgeError {
        match self {
            Self::External { reason } => wrap(reason),
            recognized => recognized,
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        Self::External {
            reason: err.to_string(),
        }
    }
}

// =============================================================================
// Codec Errors
// =============================================================================

/// Errors from the transaction/wire codec layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Address is not base58 text of a 32-byte identity.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Signature is not base58 text of 64 bytes.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Transaction could not be compiled.
    #[error("transaction build error: {0}")]
    Build(String),

    /// Signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Wire bytes could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn or_wrap_attributes_external_errors() {
        let err = BridgeError::external("device exploded");
        let wrapped = err.or_wrap(|reason| BridgeError::SignTransaction { reason });
        assert_eq!(
            wrapped,
            BridgeError::SignTransaction {
                reason: "device exploded".into()
            }
        );
    }

    #[test]
    fn or_wrap_passes_recognized_errors_through() {
        let err = BridgeError::NotConnected;
        let wrapped = err.or_wrap(|reason| BridgeError::SendTransaction { reason });
        assert_eq!(wrapped, BridgeError::NotConnected);
    }

    #[test]
    fn codec_errors_cross_as_external() {
        let err: BridgeError = CodecError::Serialization("truncated".into()).into();
        assert!(!err.is_recognized());
        assert_eq!(err.to_string(), "serialization error: truncated");
    }

    #[test]
    fn display_names_the_missing_capability() {
        let err = BridgeError::Config {
            capability: Capability::SignMessage,
        };
        assert_eq!(err.to_string(), "device does not support 'sign-message'");
    }
}
