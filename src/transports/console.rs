//! Console transport

use crate::core::{LogEntry, LogLevel, LoggerError, OutputFormat, Result, Transport};
use std::io::{self, Write};

/// Writes human-readable lines to the terminal
///
/// `error` entries go to stderr, everything else to stdout.
pub struct ConsoleTransport {
    format: OutputFormat,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl ConsoleTransport {
    pub fn new(format: OutputFormat) -> Self {
        Self::with_writers(format, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Use custom sinks in place of stdout and stderr
    ///
    /// # Example
    ///
    /// ```
    /// use ema_cross_bot::prelude::*;
    ///
    /// let console = ConsoleTransport::with_writers(
    ///     OutputFormat::Human { colors: false },
    ///     Box::new(Vec::new()),
    ///     Box::new(std::io::sink()),
    /// );
    /// assert_eq!(console.name(), "console");
    /// ```
    pub fn with_writers(
        format: OutputFormat,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self { format, out, err }
    }

    pub fn format(&self) -> &OutputFormat {
        &self.format
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

impl Transport for ConsoleTransport {
    fn log(&mut self, entry: &LogEntry) -> Result<()> {
        let line = self.format.format(entry);
        let target = match entry.level {
            LogLevel::Error => &mut self.err,
            _ => &mut self.out,
        };

        writeln!(target, "{}", line)
            .map_err(|e| LoggerError::transport_write("console", e.to_string()))
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        self.err.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
