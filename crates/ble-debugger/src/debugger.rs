use crate::{DebuggerConfig, InstallOutcome, InterceptionState, MetricsHub};
use event_sink::{hex_tokens, ConsoleSubscriber, EventSink, HistorySubscriber, LogEvent, Severity};
use frame_decoder::{DecodeRule, DecodedCommand, DecoderRegistry};
use host_api::DeviceRequestSlot;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

/// Context object tying the sink, the decoder registry and the interception state together.
///
/// Build one per host with [`Debugger::new`] and share it; nothing here is global.
pub struct Debugger {
    sink: Arc<EventSink>,
    history: Arc<HistorySubscriber>,
    registry: RwLock<DecoderRegistry>,
    state: InterceptionState,
    metrics: MetricsHub,
}

impl Debugger {
    /// Register the built-in and configured decoders and wire the default subscribers.
    pub fn new(config: &DebuggerConfig) -> anyhow::Result<Self> {
        let metrics = MetricsHub::new().map_err(anyhow::Error::msg)?;

        let mut registry = DecoderRegistry::with_defaults();
        for spec in config.table_specs()? {
            registry.register_spec(&spec)?;
        }

        let sink = Arc::new(EventSink::new());
        sink.set_enabled(config.enabled);
        sink.set_console_fallback(config.console);

        let history = Arc::new(HistorySubscriber::new(config.history_capacity));
        sink.subscribe_arc(history.clone());
        if config.console {
            sink.subscribe(ConsoleSubscriber);
        }
        let emitted = metrics.events_emitted.clone();
        sink.subscribe(move |_: &LogEvent| emitted.inc());

        tracing::info!(
            enabled = config.enabled,
            rules = registry.len(),
            "bluetooth debugger ready"
        );
        sink.success(|| "Debugger initialised".to_string());

        Ok(Self {
            sink,
            history,
            registry: RwLock::new(registry),
            state: InterceptionState::new(),
            metrics,
        })
    }

    /// Create a debugger and install it on `slot` in one go.
    pub fn start(config: &DebuggerConfig, slot: &DeviceRequestSlot) -> anyhow::Result<Self> {
        let dbg = Self::new(config)?;
        dbg.install(slot);
        Ok(dbg)
    }

    pub fn sink(&self) -> &Arc<EventSink> {
        &self.sink
    }

    /// The in-memory log a panel renders from.
    pub fn history(&self) -> &Arc<HistorySubscriber> {
        &self.history
    }

    pub fn metrics(&self) -> &MetricsHub {
        &self.metrics
    }

    pub fn registry(&self) -> RwLockReadGuard<'_, DecoderRegistry> {
        self.registry.read()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.sink.set_enabled(enabled);
    }

    pub fn register(&self, rule: DecodeRule) {
        self.registry.write().register(rule);
    }

    pub fn is_installed(&self) -> bool {
        self.state.is_installed()
    }

    /// Wrap the host's `request_device`. Safe to call any number of times.
    pub fn install(&self, slot: &DeviceRequestSlot) -> InstallOutcome {
        let outcome = self.state.install(slot, &self.sink, &self.metrics);
        match outcome {
            InstallOutcome::Installed => {
                self.sink
                    .success(|| "Bluetooth monitoring started".to_string());
            }
            InstallOutcome::AlreadyInstalled => {
                tracing::debug!("request_device already intercepted");
            }
            InstallOutcome::Unavailable => {
                self.sink
                    .error(|| "Web Bluetooth API is not available".to_string());
            }
        }
        outcome
    }

    /// Decode one frame received from a device of `kind` and log the result.
    ///
    /// Never fails: a frame that cannot be decoded is logged as an error and reported with a
    /// placeholder command.
    pub fn observe_frame(&self, kind: &str, frame: &[u8]) -> DecodedCommand {
        let (label, decoded) = {
            let registry = self.registry.read();
            (registry.label_for(kind).to_string(), registry.decode(kind, frame))
        };
        match decoded {
            Ok(cmd) => {
                if cmd.is_unknown() {
                    self.metrics.frames_unknown.inc();
                } else {
                    self.metrics.frames_decoded.inc();
                }
                self.sink
                    .info(|| format!("{label} Command: {} (0x{:x})", cmd.name, cmd.opcode));
                self.sink.log_raw(Severity::Info, frame, || {
                    format!("Raw Data: {}", hex_tokens(frame))
                });
                cmd
            }
            Err(e) => {
                self.metrics.frames_malformed.inc();
                self.sink
                    .log_raw(Severity::Error, frame, || format!("{label}: {e}"));
                DecodedCommand::malformed(frame.len())
            }
        }
    }

    /// Empty the in-memory log and note that it happened.
    pub fn clear_logs(&self) {
        self.history.clear();
        self.sink.info(|| "Log cleared".to_string());
    }
}
