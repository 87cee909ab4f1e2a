//! Registration loop: publishes an adapter into a discovery registry.
//!
//! [`register_adapter`] wraps the adapter in an [`OutboundBridge`] and
//! registers it exactly once per adapter/chain pair:
//!
//! - registration is attempted immediately and retried on every
//!   ready-state change until it succeeds;
//! - an already-registered device matching the predicate (name equality by
//!   default) means the need is already satisfied and nothing is published;
//! - once published, the bridge withdraws itself as soon as a matching
//!   device registers natively.
//!
//! The returned [`RegistrationHandle`] tears everything down idempotently.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use trestle_core::{
    Adapter, AdapterEvent, BoxedDevice, ChainId, Device, ReadyState, RpcClient, Subscription,
};

use crate::outbound::OutboundBridge;
use crate::registry::DiscoveryRegistry;

/// Predicate deciding whether a registered device satisfies (or supersedes)
/// the adapter.
pub type MatchPredicate = Arc<dyn Fn(&dyn Device) -> bool + Send + Sync>;

type TeardownFn = Box<dyn FnOnce() + Send>;
type Destructors = Arc<Mutex<Vec<TeardownFn>>>;

/// Idempotent teardown for a registered adapter. Safe to call in any state,
/// any number of times.
pub struct RegistrationHandle {
    destructors: Destructors,
}

impl RegistrationHandle {
    /// Cancels pending subscriptions and withdraws the registration if
    /// active.
    pub fn teardown(&self) {
        teardown_all(&self.destructors);
    }
}

fn teardown_all(destructors: &Destructors) {
    let drained: Vec<TeardownFn> = {
        let mut guard = destructors.lock();
        guard.drain(..).collect()
    };
    for destructor in drained {
        destructor();
    }
}

/// Publishes `adapter` into `registry` as soon as it is ready.
///
/// `matcher` defaults to name equality against the adapter.
pub fn register_adapter(
    registry: &DiscoveryRegistry,
    adapter: Arc<dyn Adapter>,
    chain: ChainId,
    rpc: Arc<dyn RpcClient>,
    matcher: Option<MatchPredicate>,
) -> RegistrationHandle {
    let matcher: MatchPredicate = matcher.unwrap_or_else(|| {
        let name = adapter.name();
        Arc::new(move |device: &dyn Device| device.name() == name)
    });

    let destructors: Destructors = Arc::new(Mutex::new(Vec::new()));

    let setup: Arc<dyn Fn() -> bool + Send + Sync> = {
        let registry = registry.clone();
        let adapter = Arc::clone(&adapter);
        let matcher = Arc::clone(&matcher);
        let destructors = Arc::clone(&destructors);
        Arc::new(move || {
            // An unsupported adapter, or a matching device that is already
            // registered, means there is nothing left to do.
            if adapter.ready_state() == ReadyState::Unsupported
                || registry.devices().iter().any(|d| matcher(d.as_ref()))
            {
                debug!(adapter = %adapter.name(), "Registration already satisfied");
                return true;
            }

            let ready = adapter.ready_state().is_usable();
            if ready {
                let bridge =
                    OutboundBridge::new(Arc::clone(&adapter), chain.clone(), Arc::clone(&rpc));
                let registration =
                    registry.register(Arc::clone(&bridge) as BoxedDevice);
                // A matching device registered later supersedes the bridge.
                let subscription = {
                    let matcher = Arc::clone(&matcher);
                    let destructors = Arc::clone(&destructors);
                    registry.on_register(move |device: &BoxedDevice| {
                        if matcher(device.as_ref()) {
                            teardown_all(&destructors);
                        }
                    })
                };

                let mut guard = destructors.lock();
                guard.push(Box::new(move || bridge.destroy()));
                guard.push(Box::new(move || registration.unregister()));
                guard.push(Box::new(move || subscription.unsubscribe()));
                info!(adapter = %adapter.name(), "Adapter published");
            }
            ready
        })
    };

    if !setup() {
        // Not ready yet: retry on every readiness change until it works,
        // then stop listening.
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let subscription = {
            let setup = Arc::clone(&setup);
            let slot = Arc::clone(&slot);
            adapter.events().subscribe(move |event: &AdapterEvent| {
                if matches!(event, AdapterEvent::ReadyStateChange { .. }) && setup() {
                    if let Some(subscription) = slot.lock().take() {
                        subscription.unsubscribe();
                    }
                }
            })
        };
        *slot.lock() = Some(subscription);

        destructors.lock().push(Box::new(move || {
            if let Some(subscription) = slot.lock().take() {
                subscription.unsubscribe();
            }
        }));
    }

    RegistrationHandle { destructors }
}
