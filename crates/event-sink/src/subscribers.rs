use crate::sink::write_console;
use crate::{LogEvent, Result, SinkError, Subscriber};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Writes every event to the console through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSubscriber;

impl Subscriber for ConsoleSubscriber {
    fn on_event(&self, event: &LogEvent) -> Result<()> {
        write_console(event);
        Ok(())
    }
}

/// Keeps the most recent events in memory, oldest dropped first.
#[derive(Debug)]
pub struct HistorySubscriber {
    capacity: usize,
    buffer: Mutex<VecDeque<LogEvent>>,
}

impl HistorySubscriber {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.buffer.lock().iter().cloned().collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.buffer
            .lock()
            .iter()
            .map(|e| e.message().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Subscriber for HistorySubscriber {
    fn on_event(&self, event: &LogEvent) -> Result<()> {
        let mut buf = self.buffer.lock();
        if buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(event.clone());
        Ok(())
    }
}

/// Forwards events to an async consumer such as a UI task.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<LogEvent>,
}

impl ChannelSubscriber {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn on_event(&self, event: &LogEvent) -> Result<()> {
        self.tx.send(event.clone()).map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventSink, Severity};
    use std::sync::Arc;

    #[test]
    fn test_history_is_bounded() {
        let hist = HistorySubscriber::new(2);
        for m in ["a", "b", "c"] {
            hist.on_event(&LogEvent::info(m)).unwrap();
        }
        assert_eq!(hist.messages(), vec!["b", "c"]);
        hist.clear();
        assert!(hist.is_empty());
    }

    #[tokio::test]
    async fn test_channel_subscriber_delivers_in_order() {
        let sink = EventSink::new();
        let (sub, mut rx) = ChannelSubscriber::channel();
        sink.subscribe(sub);
        sink.info(|| "first".into());
        sink.log_raw(Severity::Info, &[0xef], || "second".into());
        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_eq!(a.message(), "first");
        assert_eq!(b.raw(), Some(&[0xef][..]));
    }

    #[test]
    fn test_closed_channel_reports_error() {
        let (sub, rx) = ChannelSubscriber::channel();
        drop(rx);
        let err = sub.on_event(&LogEvent::info("x")).unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }

    #[test]
    fn test_closed_channel_does_not_starve_others() {
        let sink = EventSink::new();
        let (sub, rx) = ChannelSubscriber::channel();
        drop(rx);
        sink.subscribe(sub);
        let hist = Arc::new(HistorySubscriber::new(4));
        sink.subscribe_arc(hist.clone());
        sink.success(|| "ok".into());
        assert_eq!(hist.len(), 1);
    }
}
