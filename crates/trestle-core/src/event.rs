//! Event fan-out.
//!
//! [`EventEmitter`] is a synchronous multiplexer: listeners run in
//! subscription order, emission snapshots the listener list first so a
//! listener may subscribe or unsubscribe reentrantly, and removing a
//! listener removes exactly one registration.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::account::Address;
use crate::device::ReadyState;
use crate::error::BridgeError;

// =============================================================================
// Subscription
// =============================================================================

/// Unsubscribe handle.
///
/// Dropping it removes the listener; [`unsubscribe`](Subscription::unsubscribe)
/// does so explicitly. Either way the removal fires at most once.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription from its cancel action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Removes the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// =============================================================================
// Event Emitter
// =============================================================================

/// Identifier of one listener registration.
pub type ListenerId = u64;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct EmitterInner<E> {
    next_id: ListenerId,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

/// Synchronous fan-out event multiplexer.
pub struct EventEmitter<E> {
    inner: Arc<Mutex<EmitterInner<E>>>,
}

impl<E> EventEmitter<E> {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EmitterInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers a listener, returning its id.
    ///
    /// Registering the same closure twice produces two independent
    /// registrations.
    pub fn on(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> ListenerId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Removes the registration with the given id, if present.
    pub fn off(&self, id: ListenerId) {
        self.inner.lock().listeners.retain(|(lid, _)| *lid != id);
    }

    /// Registers a listener wrapped in a [`Subscription`] guard.
    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> Subscription
    where
        E: 'static,
    {
        let id = self.on(listener);
        let emitter = self.clone();
        Subscription::new(move || emitter.off(id))
    }

    /// Calls every listener with `event`, in subscription order.
    ///
    /// The listener list is snapshotted before the first call, so listeners
    /// added or removed during emission take effect from the next emission.
    pub fn emit(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self
            .inner
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of active registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl<E> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// Adapter Events
// =============================================================================

/// Events emitted by adapters.
#[derive(Debug, Clone)]
pub enum AdapterEvent {
    /// An account was bound; carries its address.
    Connect {
        /// Address of the newly bound account.
        address: Address,
    },
    /// The account binding was cleared.
    Disconnect,
    /// An operation failed. Emitted in addition to the error return.
    Error {
        /// The failure, possibly wrapped to its operation kind.
        error: BridgeError,
    },
    /// The device-side disconnect call failed. Non-fatal: local
    /// disconnection completed regardless.
    DisconnectError {
        /// The underlying failure.
        error: BridgeError,
    },
    /// The adapter's readiness changed.
    ReadyStateChange {
        /// The new ready state.
        state: ReadyState,
    },
}
