//! # EMA Cross Bot
//!
//! Service shell for the 20-50 EMA Cross Over Bot. The core is a structured
//! logging subsystem; the HTTP shell (feature `server`) is a thin collaborator
//! on top of it.
//!
//! ## Features
//!
//! - **Dual format**: JSON lines for files, colorized text for the console
//! - **Per-level routing**: every transport has its own minimum level
//! - **Daily rotation**: size cap, gzip archives and retention per file
//! - **Non-blocking files**: each file transport writes on its own worker
//!
//! ## Example
//!
//! ```no_run
//! use ema_cross_bot::prelude::*;
//!
//! let config = LoggerConfig::from_env().unwrap();
//! let logger = Logger::from_config(&config).unwrap();
//!
//! logger.info("Server started");
//! logger.error_with("Unhandled rejection", "http", Meta::new().with("errorMsg", "boom"));
//! ```

pub mod config;
pub mod core;
pub mod macros;
#[cfg(feature = "server")]
pub mod server;
pub mod transports;

pub mod prelude {
    pub use crate::config::{Destination, LoggerConfig, ServerConfig, TransportConfig};
    pub use crate::core::{
        ErrorDetail, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Meta,
        MetaValue, OutputFormat, OverflowPolicy, Result, Transport,
    };
    pub use crate::transports::{ConsoleTransport, DailyRotateFile, RotationPolicy};
}

pub use crate::config::{LoggerConfig, ServerConfig};
pub use crate::core::{
    ensure_directory, ErrorDetail, LogDirectory, LogEntry, LogLevel, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, Meta, MetaValue, OutputFormat, OverflowPolicy, QueuedTransport,
    Result, StructuredRecord, TimestampFormat, Transport, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::transports::{ConsoleTransport, DailyRotateFile, RotationPolicy};
