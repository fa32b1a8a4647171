// Log sinks for SDK consumers that want to route diagnostics themselves

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogSeverity {
    Verbose,
    Information,
    Warning,
    Error,
    Critical,
}

impl From<LogSeverity> for log::Level {
    fn from(severity: LogSeverity) -> Self {
        match severity {
            LogSeverity::Verbose => log::Level::Debug,
            LogSeverity::Information => log::Level::Info,
            LogSeverity::Warning => log::Level::Warn,
            LogSeverity::Error | LogSeverity::Critical => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub severity: LogSeverity,
    pub message: String,
    /// Where the record came from, e.g. a module or service name
    pub location: Option<String>,
}

impl LogRecord {
    pub fn new(severity: LogSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn log(&self, record: LogRecord);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogSink;

#[async_trait]
impl LogSink for NoopLogSink {
    async fn log(&self, _record: LogRecord) {}
}

/// Forwards records to the `log` facade, dropping those below `min_severity`
#[derive(Debug, Clone, Copy)]
pub struct ForwardingLogSink {
    min_severity: LogSeverity,
}

impl ForwardingLogSink {
    pub fn new(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }
}

impl Default for ForwardingLogSink {
    fn default() -> Self {
        Self::new(LogSeverity::Information)
    }
}

#[async_trait]
impl LogSink for ForwardingLogSink {
    async fn log(&self, record: LogRecord) {
        if record.severity < self.min_severity {
            return;
        }
        let level: log::Level = record.severity.into();
        match &record.location {
            Some(location) => log::log!(target: "nexus_link", level, "[{}] {}", location, record.message),
            None => log::log!(target: "nexus_link", level, "{}", record.message),
        }
    }
}
