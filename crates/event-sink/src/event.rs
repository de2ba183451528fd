use core::fmt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;

/// How a log line should be weighted by whoever renders it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Success,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Success => "success",
        }
    }

    /// Accent colour of the debug panel for this severity.
    pub fn color(self) -> &'static str {
        match self {
            Severity::Info => "#33b5e5",
            Severity::Warn => "#ffbb33",
            Severity::Error => "#ff4444",
            Severity::Success => "#00C851",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single debug log entry. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEvent {
    timestamp: OffsetDateTime,
    severity: Severity,
    message: String,
    raw: Option<Arc<[u8]>>,
}

impl LogEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            severity,
            message: message.into(),
            raw: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    /// Attach the raw bytes the event is about.
    pub fn with_raw(mut self, raw: &[u8]) -> Self {
        self.raw = Some(Arc::from(raw));
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// `[HH:MM:SS] message`, the line a log panel shows.
    pub fn display_line(&self) -> String {
        let ts = self.timestamp;
        format!(
            "[{:02}:{:02}:{:02}] {}",
            ts.hour(),
            ts.minute(),
            ts.second(),
            self.message
        )
    }

    /// Serializable form of the event. A timestamp that cannot be rendered is left out rather
    /// than failing the export.
    pub fn to_record(&self) -> LogRecord {
        LogRecord {
            ts: self
                .timestamp
                .format(&time::format_description::well_known::Rfc3339)
                .ok(),
            severity: self.severity,
            message: self.message.clone(),
            raw: self.raw.as_deref().map(hex_tokens),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Render bytes as comma separated, individually formatted hex tokens: `0x0, 0xed, 0x1f`.
pub fn hex_tokens(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{b:x}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_tokens_unpadded() {
        assert_eq!(hex_tokens(&[0x00, 0x0a, 0xed, 0x10]), "0x0, 0xa, 0xed, 0x10");
        assert_eq!(hex_tokens(&[]), "");
    }

    #[test]
    fn test_display_line() {
        let ts = OffsetDateTime::from_unix_timestamp(3_723).unwrap();
        let ev = LogEvent::info("hello").with_timestamp(ts);
        assert_eq!(ev.display_line(), "[01:02:03] hello");
    }

    #[test]
    fn test_record_carries_raw_and_ts() {
        let ev = LogEvent::info("Raw Data").with_raw(&[0x01, 0xef]);
        let rec = ev.to_record();
        assert_eq!(rec.raw.as_deref(), Some("0x1, 0xef"));
        assert!(rec.ts.is_some());
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"severity\":\"info\""));
    }

    #[test]
    fn test_severity_colors() {
        assert_eq!(Severity::Error.color(), "#ff4444");
        assert_eq!(Severity::Success.color(), "#00C851");
        assert_eq!(Severity::Warn.color(), "#ffbb33");
        assert_eq!(Severity::Info.color(), "#33b5e5");
    }
}
