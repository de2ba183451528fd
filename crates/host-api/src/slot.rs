use crate::{BluetoothDevice, RequestDevice, RequestDeviceOptions, RequestError, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// The host's replaceable `request_device` method.
///
/// Callers always go through the slot, so whatever implementation currently occupies it (the
/// host's own or a wrapper around it) is what they reach. A slot may be empty when the host has
/// no Bluetooth support at all.
pub struct DeviceRequestSlot {
    current: RwLock<Option<Arc<dyn RequestDevice>>>,
}

impl DeviceRequestSlot {
    pub fn new(imp: Arc<dyn RequestDevice>) -> Self {
        Self {
            current: RwLock::new(Some(imp)),
        }
    }

    /// A host without Bluetooth support.
    pub fn unavailable() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.current.read().is_some()
    }

    /// Current occupant of the slot.
    pub fn get(&self) -> Option<Arc<dyn RequestDevice>> {
        self.current.read().clone()
    }

    /// Swap in a new implementation, returning the previous one.
    pub fn replace(&self, imp: Arc<dyn RequestDevice>) -> Option<Arc<dyn RequestDevice>> {
        self.current.write().replace(imp)
    }

    /// Invoke whatever implementation currently occupies the slot.
    pub async fn request_device(&self, options: &RequestDeviceOptions) -> Result<BluetoothDevice> {
        // Clone out of the lock so it is not held across the await.
        let imp = self.get().ok_or_else(|| {
            RequestError::NotSupported("Web Bluetooth API is not available".into())
        })?;
        imp.request_device(options).await
    }
}
