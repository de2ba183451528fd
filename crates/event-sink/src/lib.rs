//! event-sink: structured debug log events and their fan-out to subscribers
//!
//! Producers build [`LogEvent`]s and hand them to an [`EventSink`], which delivers each one to
//! every registered [`Subscriber`]. The sink owns no rendering; a panel, a terminal or a test
//! harness decides how to show what it receives. Until somebody subscribes, events fall back to
//! console output through `tracing` so nothing is lost during start-up.

mod event;
pub use event::{hex_tokens, LogEvent, LogRecord, Severity};

mod error;
pub use error::{Result, SinkError};

mod sink;
pub use sink::{EventSink, Subscriber, SubscriptionId, CONSOLE_TARGET};

mod subscribers;
pub use subscribers::{ChannelSubscriber, ConsoleSubscriber, HistorySubscriber};
