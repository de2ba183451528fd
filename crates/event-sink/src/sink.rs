use crate::{LogEvent, Result, Severity};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// `tracing` target used for console output of debug events.
pub const CONSOLE_TARGET: &str = "ble_debug";

/// Receiver of log events.
pub trait Subscriber: Send + Sync {
    fn on_event(&self, event: &LogEvent) -> Result<()>;
}

impl<F> Subscriber for F
where
    F: Fn(&LogEvent) + Send + Sync,
{
    fn on_event(&self, event: &LogEvent) -> Result<()> {
        self(event);
        Ok(())
    }
}

/// Handle returned by [`EventSink::subscribe`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out point for log events.
///
/// Dispatch is synchronous: each subscriber sees events in emission order. A subscriber that
/// errors or panics is reported and skipped; the rest still get the event.
pub struct EventSink {
    enabled: AtomicBool,
    console_fallback: AtomicBool,
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn Subscriber>)>>,
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            console_fallback: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Turn all emission on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether events go to the console while nobody is subscribed.
    pub fn set_console_fallback(&self, on: bool) {
        self.console_fallback.store(on, Ordering::Relaxed);
    }

    pub fn subscribe(&self, subscriber: impl Subscriber + 'static) -> SubscriptionId {
        self.subscribe_arc(Arc::new(subscriber))
    }

    pub fn subscribe_arc(&self, subscriber: Arc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, subscriber));
        id
    }

    /// Returns false if the handle was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver an already built event.
    pub fn emit(&self, event: LogEvent) {
        if !self.is_enabled() {
            return;
        }
        self.dispatch(&event);
    }

    /// Build and deliver an event. `message` only runs when emission is enabled.
    pub fn log(&self, severity: Severity, message: impl FnOnce() -> String) {
        if !self.is_enabled() {
            return;
        }
        self.dispatch(&LogEvent::new(severity, message()));
    }

    /// Like [`EventSink::log`], attaching `raw` as the event payload.
    pub fn log_raw(&self, severity: Severity, raw: &[u8], message: impl FnOnce() -> String) {
        if !self.is_enabled() {
            return;
        }
        self.dispatch(&LogEvent::new(severity, message()).with_raw(raw));
    }

    pub fn info(&self, message: impl FnOnce() -> String) {
        self.log(Severity::Info, message);
    }

    pub fn success(&self, message: impl FnOnce() -> String) {
        self.log(Severity::Success, message);
    }

    pub fn warn(&self, message: impl FnOnce() -> String) {
        self.log(Severity::Warn, message);
    }

    pub fn error(&self, message: impl FnOnce() -> String) {
        self.log(Severity::Error, message);
    }

    fn dispatch(&self, event: &LogEvent) {
        // Snapshot so subscribers may (un)subscribe or emit from inside their handler.
        let subs: Vec<(SubscriptionId, Arc<dyn Subscriber>)> = self.subscribers.read().clone();
        if subs.is_empty() {
            if self.console_fallback.load(Ordering::Relaxed) {
                write_console(event);
            }
            return;
        }
        for (id, sub) in subs {
            match catch_unwind(AssertUnwindSafe(|| sub.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(target: CONSOLE_TARGET, subscriber = id.0, error = %e, "subscriber rejected event");
                }
                Err(_) => {
                    tracing::warn!(target: CONSOLE_TARGET, subscriber = id.0, "subscriber panicked while handling event");
                }
            }
        }
    }
}

pub(crate) fn write_console(event: &LogEvent) {
    let msg = event.message();
    match event.severity() {
        Severity::Error => tracing::error!(target: CONSOLE_TARGET, "[Bluetooth Debug] {msg}"),
        Severity::Warn => tracing::warn!(target: CONSOLE_TARGET, "[Bluetooth Debug] {msg}"),
        Severity::Info | Severity::Success => {
            tracing::info!(target: CONSOLE_TARGET, severity = %event.severity(), "[Bluetooth Debug] {msg}")
        }
    }
}
