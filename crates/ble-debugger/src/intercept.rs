use crate::MetricsHub;
use async_trait::async_trait;
use event_sink::EventSink;
use host_api::{BluetoothDevice, DeviceRequestSlot, RequestDevice, RequestDeviceOptions};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Logged in place of a value that could not be serialized.
pub const SERIALIZATION_PLACEHOLDER: &str = "<unserializable>";

/// Best-effort JSON rendering of a value for a log line.
pub fn describe<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| SERIALIZATION_PLACEHOLDER.to_string())
}

/// Wraps a `request_device` implementation and reports every call to the sink.
///
/// Results pass through untouched: the device the delegate resolved with, or the exact error it
/// failed with. Nothing is retried, delayed or buffered.
pub struct Interceptor {
    delegate: Arc<dyn RequestDevice>,
    sink: Arc<EventSink>,
    metrics: MetricsHub,
}

impl Interceptor {
    pub fn new(delegate: Arc<dyn RequestDevice>, sink: Arc<EventSink>, metrics: MetricsHub) -> Self {
        Self {
            delegate,
            sink,
            metrics,
        }
    }
}

#[async_trait]
impl RequestDevice for Interceptor {
    async fn request_device(
        &self,
        options: &RequestDeviceOptions,
    ) -> host_api::Result<BluetoothDevice> {
        let call = Uuid::new_v4();
        self.metrics.requests_started.inc();
        self.sink.info(|| {
            format!(
                "requestDevice called [{call}] with options: {}",
                describe(options)
            )
        });

        match self.delegate.request_device(options).await {
            Ok(device) => {
                self.metrics.requests_resolved.inc();
                self.sink
                    .success(|| format!("Device selected [{call}]: {}", device.display_name()));
                Ok(device)
            }
            Err(err) => {
                self.metrics.requests_rejected.inc();
                self.sink.error(|| {
                    format!(
                        "requestDevice error [{call}]: {} ({})",
                        err.message(),
                        err.kind()
                    )
                });
                Err(err)
            }
        }
    }

    fn is_interceptor(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// The slot is already wrapped; nothing changed.
    AlreadyInstalled,
    /// The host has no Bluetooth entry point to wrap.
    Unavailable,
}

/// Tracks the one wrapper a debugger installs and the original it delegates to.
#[derive(Default)]
pub struct InterceptionState {
    original: OnceLock<Arc<dyn RequestDevice>>,
}

impl InterceptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.original.get().is_some()
    }

    /// The unwrapped implementation captured at install time.
    pub fn original(&self) -> Option<&Arc<dyn RequestDevice>> {
        self.original.get()
    }

    /// Replace the slot's implementation with an [`Interceptor`] around it.
    ///
    /// Only the first successful call wraps anything. Later calls, and calls on a slot that
    /// already holds an interceptor, leave the slot as it is.
    pub fn install(
        &self,
        slot: &DeviceRequestSlot,
        sink: &Arc<EventSink>,
        metrics: &MetricsHub,
    ) -> InstallOutcome {
        if self.is_installed() {
            return InstallOutcome::AlreadyInstalled;
        }
        let current = match slot.get() {
            Some(imp) => imp,
            None => return InstallOutcome::Unavailable,
        };
        if current.is_interceptor() {
            return InstallOutcome::AlreadyInstalled;
        }
        if self.original.set(current.clone()).is_err() {
            return InstallOutcome::AlreadyInstalled;
        }
        slot.replace(Arc::new(Interceptor::new(
            current,
            sink.clone(),
            metrics.clone(),
        )));
        tracing::debug!("request_device interceptor installed");
        InstallOutcome::Installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_sink::{HistorySubscriber, Severity};
    use host_api::{DeviceFilter, MockBluetooth, RequestError};
    use std::collections::HashMap;

    fn fixture() -> (Arc<EventSink>, Arc<HistorySubscriber>, MetricsHub) {
        let sink = Arc::new(EventSink::new());
        let hist = Arc::new(HistorySubscriber::new(64));
        sink.subscribe_arc(hist.clone());
        (sink, hist, MetricsHub::new().unwrap())
    }

    fn gan() -> BluetoothDevice {
        BluetoothDevice::new("dev-gan", Some("GANi3-1A2B"))
    }

    #[tokio::test]
    async fn test_resolved_value_passes_through() {
        let (sink, hist, metrics) = fixture();
        let mock = Arc::new(MockBluetooth::with_devices(vec![gan()]));
        let slot = DeviceRequestSlot::new(mock.clone());
        let state = InterceptionState::new();
        assert_eq!(state.install(&slot, &sink, &metrics), InstallOutcome::Installed);

        let opts = RequestDeviceOptions::default().with_filter(DeviceFilter::name_prefix("GAN"));
        let dev = slot.request_device(&opts).await.unwrap();
        assert_eq!(dev, gan());

        let events = hist.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].severity(), Severity::Info);
        assert!(events[0].message().contains("\"namePrefix\":\"GAN\""));
        assert_eq!(events[1].severity(), Severity::Success);
        assert!(events[1].message().ends_with(": GANi3-1A2B"));
        assert_eq!(metrics.requests_resolved.get(), 1);
    }

    #[tokio::test]
    async fn test_unnamed_device_placeholder() {
        let (sink, hist, metrics) = fixture();
        let slot = DeviceRequestSlot::new(Arc::new(MockBluetooth::with_devices(vec![
            BluetoothDevice::new("anon", None),
        ])));
        InterceptionState::new().install(&slot, &sink, &metrics);
        let dev = slot
            .request_device(&RequestDeviceOptions::accept_all())
            .await
            .unwrap();
        assert_eq!(dev.name, None);
        assert!(hist.messages()[1].ends_with(": unnamed"));
    }

    #[tokio::test]
    async fn test_error_passes_through_unchanged() {
        let (sink, hist, metrics) = fixture();
        let mock = Arc::new(MockBluetooth::with_devices(vec![gan()]));
        mock.fail_next(RequestError::Security("Origin is not allowed".into()));
        let slot = DeviceRequestSlot::new(mock);
        InterceptionState::new().install(&slot, &sink, &metrics);

        let err = slot
            .request_device(&RequestDeviceOptions::accept_all())
            .await
            .unwrap_err();
        assert_eq!(err, RequestError::Security("Origin is not allowed".into()));
        assert_eq!(err.kind(), "SecurityError");

        let errors: Vec<_> = hist
            .snapshot()
            .into_iter()
            .filter(|e| e.severity() == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("Origin is not allowed"));
        assert_eq!(metrics.requests_rejected.get(), 1);
    }

    #[tokio::test]
    async fn test_double_install_wraps_once() {
        let (sink, hist, metrics) = fixture();
        let mock = Arc::new(MockBluetooth::with_devices(vec![gan()]));
        let slot = DeviceRequestSlot::new(mock.clone());
        let state = InterceptionState::new();
        assert_eq!(state.install(&slot, &sink, &metrics), InstallOutcome::Installed);
        assert_eq!(
            state.install(&slot, &sink, &metrics),
            InstallOutcome::AlreadyInstalled
        );
        // A second, independent state must not stack another layer either.
        assert_eq!(
            InterceptionState::new().install(&slot, &sink, &metrics),
            InstallOutcome::AlreadyInstalled
        );

        slot.request_device(&RequestDeviceOptions::accept_all())
            .await
            .unwrap();
        assert_eq!(hist.len(), 2);
        assert_eq!(mock.calls(), 1);
        assert!(!state.original().map(|o| o.is_interceptor()).unwrap_or(true));
    }

    #[test]
    fn test_unavailable_host() {
        let (sink, _hist, metrics) = fixture();
        let slot = DeviceRequestSlot::unavailable();
        let state = InterceptionState::new();
        assert_eq!(
            state.install(&slot, &sink, &metrics),
            InstallOutcome::Unavailable
        );
        assert!(!state.is_installed());
    }

    /// Yields `delay` times before answering so overlapping calls interleave.
    struct Staggered;

    #[async_trait]
    impl RequestDevice for Staggered {
        async fn request_device(
            &self,
            options: &RequestDeviceOptions,
        ) -> host_api::Result<BluetoothDevice> {
            let prefix = options
                .filters
                .first()
                .and_then(|f| f.name_prefix.clone())
                .unwrap_or_default();
            let delay = if prefix == "slow" { 5 } else { 1 };
            for _ in 0..delay {
                tokio::task::yield_now().await;
            }
            if prefix == "fail" {
                return Err(RequestError::NotFound("nothing nearby".into()));
            }
            Ok(BluetoothDevice::new(prefix.clone(), Some(prefix.as_str())))
        }
    }

    #[tokio::test]
    async fn test_overlapping_calls_keep_per_call_order() {
        let (sink, hist, metrics) = fixture();
        let slot = DeviceRequestSlot::new(Arc::new(Staggered));
        InterceptionState::new().install(&slot, &sink, &metrics);

        let slow = RequestDeviceOptions::default().with_filter(DeviceFilter::name_prefix("slow"));
        let fast = RequestDeviceOptions::default().with_filter(DeviceFilter::name_prefix("fast"));
        let fail = RequestDeviceOptions::default().with_filter(DeviceFilter::name_prefix("fail"));
        let (a, b, c) = tokio::join!(
            slot.request_device(&slow),
            slot.request_device(&fast),
            slot.request_device(&fail)
        );
        assert_eq!(a.unwrap().id, "slow");
        assert_eq!(b.unwrap().id, "fast");
        assert!(c.is_err());

        // Group by call id: each call has its "called" event strictly before its outcome.
        let mut seen: HashMap<String, Vec<Severity>> = HashMap::new();
        for ev in hist.snapshot() {
            let msg = ev.message();
            let start = msg.find('[').unwrap();
            let end = msg.find(']').unwrap();
            seen.entry(msg[start + 1..end].to_string())
                .or_default()
                .push(ev.severity());
        }
        assert_eq!(seen.len(), 3);
        for severities in seen.values() {
            assert_eq!(severities.len(), 2);
            assert_eq!(severities[0], Severity::Info);
            assert!(matches!(severities[1], Severity::Success | Severity::Error));
        }
    }

    #[test]
    fn test_describe_options() {
        let opts = RequestDeviceOptions::accept_all().with_optional_service("fff0");
        assert_eq!(
            describe(&opts),
            r#"{"optionalServices":["fff0"],"acceptAllDevices":true}"#
        );
    }

    #[test]
    fn test_describe_falls_back_on_failure() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cannot serialize"))
            }
        }
        assert_eq!(describe(&Broken), SERIALIZATION_PLACEHOLDER);
    }
}
