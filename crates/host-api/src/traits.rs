use crate::{BluetoothDevice, RequestDeviceOptions, Result};
use async_trait::async_trait;

/// The host's asynchronous "request device" entry point.
#[async_trait]
pub trait RequestDevice: Send + Sync {
    /// Ask the host to pick a peripheral matching `options`.
    async fn request_device(&self, options: &RequestDeviceOptions) -> Result<BluetoothDevice>;

    /// True for wrappers that observe another implementation rather than talk to a host.
    fn is_interceptor(&self) -> bool {
        false
    }
}
