//! Log entry structure

use super::log_level::LogLevel;
use super::meta::Meta;
use chrono::{DateTime, Local};

/// One log record, built once per facade call and shared read-only with every
/// transport.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub module: Option<String>,
    pub message: String,
    pub meta: Meta,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            module: None,
            message: Self::sanitize_message(&message.into()),
            meta: Meta::new(),
        }
    }

    /// Tag the entry with a logical module; an empty name leaves it untagged
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        let module = module.into();
        self.module = if module.is_empty() { None } else { Some(module) };
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Override the capture time (replaying records, simulating clock changes)
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_sanitized() {
        let entry = LogEntry::new(LogLevel::Info, "line one\nERROR fake\tentry\r");
        assert_eq!(entry.message, "line one\\nERROR fake\\tentry\\r");
    }

    #[test]
    fn test_empty_module_is_absent() {
        let entry = LogEntry::new(LogLevel::Info, "x").with_module("");
        assert_eq!(entry.module, None);

        let entry = LogEntry::new(LogLevel::Info, "x").with_module("http");
        assert_eq!(entry.module.as_deref(), Some("http"));
    }
}
