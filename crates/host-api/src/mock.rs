use crate::{BluetoothDevice, RequestDevice, RequestDeviceOptions, RequestError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An in-process stand-in for a host with a Bluetooth chooser.
///
/// The chooser "picks" the first known device the options accept. A queued failure is returned
/// by the next call instead.
#[derive(Default)]
pub struct MockBluetooth {
    devices: Vec<BluetoothDevice>,
    failure: Mutex<Option<RequestError>>,
    calls: AtomicUsize,
}

impl MockBluetooth {
    pub fn with_devices(devices: Vec<BluetoothDevice>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: RequestError) {
        *self.failure.lock() = Some(err);
    }

    /// Number of times the entry point has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestDevice for MockBluetooth {
    async fn request_device(&self, options: &RequestDeviceOptions) -> Result<BluetoothDevice> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().take() {
            return Err(err);
        }
        self.devices
            .iter()
            .find(|d| options.accepts(d.name.as_deref()))
            .cloned()
            .ok_or_else(|| {
                RequestError::NotFound("User cancelled the requestDevice() chooser.".into())
            })
    }
}
