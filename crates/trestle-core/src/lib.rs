//! # Trestle Core
//!
//! Core types for the Trestle signer-bridge toolkit.
//!
//! Trestle glues two signer-facing surfaces together:
//!
//! - a **device** ([`Device`]) advertises an open-ended, runtime-mutable
//!   capability list and exposes batched request/output operations;
//! - an **adapter** ([`Adapter`]) exposes a fixed set of lifecycle
//!   operations (connect, disconnect, sign, send) with typed errors and an
//!   event stream.
//!
//! The bridges living in `trestle-bridge` translate between the two in both
//! directions. This crate holds everything they share:
//!
//! - **Capability model**: [`Capability`], [`CapabilityList`],
//!   [`CapabilitySet`] — what is advertised versus what is bound right now.
//! - **Identity**: [`Address`], [`Account`], [`ChainId`].
//! - **Transactions**: [`TransactionMessage`] (structured) and
//!   [`Transaction`] (compiled, signature-bearing), with the binary codec
//!   and [`WireTransaction`] text form.
//! - **Events**: [`EventEmitter`], [`Subscription`], [`AdapterEvent`],
//!   [`DeviceChange`].
//! - **Collaborators**: the [`RpcClient`] trait and its option types.
//! - **Errors**: [`BridgeError`] and [`CodecError`].

pub mod account;
pub mod adapter;
pub mod capability;
pub mod device;
pub mod error;
pub mod event;
pub mod rpc;
pub mod transaction;
pub mod wire;

pub use account::{Account, Address, ChainId};
pub use adapter::{Adapter, BoxedAdapter};
pub use capability::{
    Capability, CapabilityEntry, CapabilityList, CapabilitySet, SignInCapability,
    SignMessageCapability, SignTransactionCapability,
};
pub use device::{
    BoxedDevice, ChangeListener, Device, DeviceChange, ReadyState, SignAndSendOutput,
    SignAndSendRequest, SignInInput, SignInOutput, SignMessageOutput, SignMessageRequest,
    SignTransactionRequest, SignedTransaction,
};
pub use error::{BridgeError, BridgeResult, CodecError, CodecResult};
pub use event::{AdapterEvent, EventEmitter, ListenerId, Subscription};
pub use rpc::{
    BlockhashInfo, BoxedRpcClient, Commitment, RpcClient, SendTransactionOptions, SubmitOptions,
};
pub use transaction::{
    AccountMeta, CompiledInstruction, Instruction, Keypair, LifetimeAnchor, Signature,
    Transaction, TransactionMessage, TransactionVersion,
};
pub use wire::WireTransaction;
