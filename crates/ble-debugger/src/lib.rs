//! ble-debugger: transparent observation of Bluetooth device requests
//!
//! [`Debugger`] is the context object a host creates once. It owns the [`event_sink::EventSink`]
//! every observation goes to, the [`frame_decoder::DecoderRegistry`] used for incoming frames
//! and the [`InterceptionState`] guarding the single wrapper installed around the host's
//! `request_device` entry point.

mod config;
pub use config::{load_config_file, DebuggerConfig};

mod metrics;
pub use metrics::MetricsHub;

mod intercept;
pub use intercept::{
    describe, InstallOutcome, InterceptionState, Interceptor, SERIALIZATION_PLACEHOLDER,
};

mod debugger;
pub use debugger::Debugger;
