//! Host log forwarding.
//!
//! The sync engine logs through `tracing`. Hosts that want those lines in
//! their own pipeline (a GUI log pane, a file, syslog) implement
//! [`LoggerSink`] and hand it to `core_runtime::logging::init_logging`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// One forwarded log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Module that emitted the line, e.g. `core_sync::index`
    pub target: String,
    pub message: String,
    /// Structured fields such as `note_id` or `path`
    pub fields: HashMap<String, String>,
    /// Innermost span the line was emitted in
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn in_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Receives log lines forwarded from the engine
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Lines below this level are never forwarded
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_carries_fields_and_span() {
        let entry = LogEntry::new(LogLevel::Warn, "core_sync::index", "Duplicate note id")
            .with_field("note_id", "abc")
            .in_span("build");

        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.field("note_id"), Some("abc"));
        assert_eq!(entry.field("path"), None);
        assert_eq!(entry.span.as_deref(), Some("build"));
    }

    #[test]
    fn test_level_ordering_and_serde_names() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Trace < LogLevel::Info);
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
    }
}
