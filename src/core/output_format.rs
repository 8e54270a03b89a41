//! Output formats for log entries
//!
//! - Structured: one JSON object per line, for persisted logs
//! - Human: colorized single-line text, for the console

use super::error::Result;
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::meta::Meta;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Persisted shape of a log entry
///
/// Example:
/// `{"timestamp":"2025-01-08 10:30:45.123","level":"error","module":"http","message":"boom","meta":{"code":500}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub timestamp: String,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl StructuredRecord {
    pub fn from_entry(entry: &LogEntry) -> Self {
        Self {
            timestamp: TimestampFormat::Millis.format(&entry.timestamp),
            level: entry.level,
            module: entry.module.clone(),
            message: entry.message.clone(),
            meta: entry.meta.clone(),
        }
    }

    /// Serialize to a single JSON line (without the trailing newline)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse one line of a structured log file
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Json` if the line is not a record.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Format pipeline selected per transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Machine-readable JSON line with millisecond timestamp
    Structured,

    /// `2025-01-08 10:30:45 [info] [http]: GET /health {"ip":"127.0.0.1"}`
    Human { colors: bool },
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Human { colors: true }
    }
}

impl OutputFormat {
    /// Format a log entry according to this output format
    pub fn format(&self, entry: &LogEntry) -> String {
        match self {
            OutputFormat::Structured => Self::format_structured(entry),
            OutputFormat::Human { colors } => Self::format_human(entry, *colors),
        }
    }

    fn format_structured(entry: &LogEntry) -> String {
        let record = StructuredRecord::from_entry(entry);
        match record.to_json() {
            Ok(json) => json,
            Err(e) => {
                // Keep the line parseable and the message intact
                eprintln!("[LOGGER WARNING] Structured formatting failed: {}", e);
                serde_json::json!({
                    "timestamp": record.timestamp,
                    "level": record.level,
                    "module": record.module,
                    "message": record.message,
                    "meta": { "serializationError": e.to_string() },
                })
                .to_string()
            }
        }
    }

    fn format_human(entry: &LogEntry, colors: bool) -> String {
        let timestamp_str = TimestampFormat::Seconds.format(&entry.timestamp);
        let mut output = format!("{} [{}]", timestamp_str, Self::level_label(entry.level, colors));

        if let Some(ref module) = entry.module {
            let _ = write!(output, " [{}]", module);
        }
        let _ = write!(output, ": {}", entry.message);

        if !entry.meta.is_empty() {
            let _ = write!(output, " {}", entry.meta.to_json_string());
        }

        output
    }

    #[cfg(feature = "console")]
    fn level_label(level: LogLevel, colors: bool) -> String {
        use colored::Colorize;

        if colors {
            level.to_str().color(level.color_code()).to_string()
        } else {
            level.to_str().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_label(level: LogLevel, _colors: bool) -> String {
        level.to_str().to_string()
    }
}
