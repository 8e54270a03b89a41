//! Timestamp formatting utilities
//!
//! The structured pipeline stamps records with millisecond precision, the
//! console with whole seconds. Both use local time so that the date in a
//! record always agrees with the date embedded in its file name.

use chrono::{DateTime, Local};

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use ema_cross_bot::core::TimestampFormat;
/// use chrono::Local;
///
/// let stamp = TimestampFormat::Millis.format(&Local::now());
/// assert_eq!(stamp.len(), "2025-01-08 10:30:45.123".len());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45.123`, used for persisted records
    #[default]
    Millis,

    /// `2025-01-08 10:30:45`, used on the console
    Seconds,
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Millis => datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            TimestampFormat::Seconds => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
