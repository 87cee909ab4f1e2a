//! # Trestle Bridge
//!
//! Bidirectional bridges between capability-advertising signer devices and
//! fixed-surface wallet adapters, plus the discovery plumbing that lets the
//! two ecosystems find each other.
//!
//! ## Components
//!
//! - [`InboundBridge`] wraps a [`Device`](trestle_core::Device) and exposes
//!   the [`Adapter`](trestle_core::Adapter) surface: a fixed set of
//!   lifecycle operations with typed errors and an event stream, with the
//!   optional operations bound or unbound from live capability
//!   introspection.
//! - [`OutboundBridge`] is the inverse: it wraps an adapter and presents it
//!   as a device, advertising exactly the capabilities the adapter binds.
//! - [`DiscoveryRegistry`] is the shared registry discovery tooling reads.
//! - [`register_adapter`] is the registration loop: it publishes an
//!   outbound bridge once the adapter is ready and withdraws it when a
//!   native device with the same identity appears.
//!
//! ## Direction of travel
//!
//! ```text
//! Device  ──InboundBridge──▶  Adapter surface (connect/sign/send + events)
//! Adapter ──OutboundBridge─▶  Device surface  (capability list + batches)
//!                 │
//!                 └── register_adapter ──▶ DiscoveryRegistry
//! ```

pub mod inbound;
pub mod outbound;
pub mod registration;
pub mod registry;

pub use inbound::InboundBridge;
pub use outbound::OutboundBridge;
pub use registration::{MatchPredicate, RegistrationHandle, register_adapter};
pub use registry::{DiscoveryRegistry, Registration};
