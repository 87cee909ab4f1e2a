//! Shared discovery registry.
//!
//! A [`DiscoveryRegistry`] holds the devices discovery tooling can see.
//! Registering returns a [`Registration`] guard; dropping it (or calling
//! [`unregister`](Registration::unregister)) withdraws the device. Register
//! notifications fire synchronously after the internal lock is released, so
//! a listener may unregister — even itself — reentrantly.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use trestle_core::{BoxedDevice, EventEmitter, Subscription};

struct RegistryInner {
    next_id: u64,
    devices: Vec<(u64, BoxedDevice)>,
}

/// Shared registry of discoverable devices.
#[derive(Clone)]
pub struct DiscoveryRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    registered: EventEmitter<BoxedDevice>,
}

impl DiscoveryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                devices: Vec::new(),
            })),
            registered: EventEmitter::new(),
        }
    }

    /// Publishes a device and notifies register listeners.
    pub fn register(&self, device: BoxedDevice) -> Registration {
        let id = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.devices.push((id, Arc::clone(&device)));
            id
        };
        info!(device = %device.name(), "Device registered");
        self.registered.emit(&device);
        Registration {
            registry: self.clone(),
            id: Some(id),
        }
    }

    /// Snapshot of the registered devices, in registration order.
    pub fn devices(&self) -> Vec<BoxedDevice> {
        self.inner
            .lock()
            .devices
            .iter()
            .map(|(_, device)| Arc::clone(device))
            .collect()
    }

    /// Number of registered devices.
    pub fn count(&self) -> usize {
        self.inner.lock().devices.len()
    }

    /// Listens for newly registered devices.
    pub fn on_register(
        &self,
        listener: impl Fn(&BoxedDevice) + Send + Sync + 'static,
    ) -> Subscription {
        self.registered.subscribe(listener)
    }

    fn unregister(&self, id: u64) {
        let removed = {
            let mut inner = self.inner.lock();
            inner
                .devices
                .iter()
                .position(|(device_id, _)| *device_id == id)
                .map(|index| inner.devices.remove(index).1)
        };
        if let Some(device) = removed {
            info!(device = %device.name(), "Device unregistered");
        }
    }
}

impl Default for DiscoveryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for one registry entry. Withdraws the device on drop or explicit
/// call; either way at most once.
pub struct Registration {
    registry: DiscoveryRegistry,
    id: Option<u64>,
}

impl Registration {
    /// Withdraws the device now.
    pub fn unregister(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.registry.unregister(id);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}
