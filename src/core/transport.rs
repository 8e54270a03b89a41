//! Transport trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// An output sink for log entries
///
/// Level filtering happens before a transport is called; an implementation
/// only formats and writes. Implementations own their destination resource.
pub trait Transport: Send {
    fn log(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
