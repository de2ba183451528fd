//! host-api: the host's asynchronous Bluetooth device-request boundary
//!
//! This crate describes the single entry point a host exposes for requesting a wireless
//! peripheral, the options it takes and the device handle it resolves to. The entry point lives
//! in a [`DeviceRequestSlot`] so that it can be swapped for a wrapper of the same shape. The
//! default build enables a `mock` backend so that everything runs without a radio.

mod types;
pub use types::{BluetoothDevice, DeviceFilter, RequestDeviceOptions};

mod error;
pub use error::{RequestError, Result};

mod traits;
pub use traits::RequestDevice;

mod slot;
pub use slot::DeviceRequestSlot;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockBluetooth;
