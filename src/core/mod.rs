//! Core logger types and traits

pub mod directory;
pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod meta;
pub mod metrics;
pub mod output_format;
pub mod overflow_policy;
pub mod timestamp;
pub mod transport;
pub mod worker;

pub use directory::{ensure_directory, LogDirectory};
pub use error::{LoggerError, Result};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, DEFAULT_QUEUE_CAPACITY};
pub use meta::{ErrorDetail, Meta, MetaValue};
pub use metrics::LoggerMetrics;
pub use output_format::{OutputFormat, StructuredRecord};
pub use overflow_policy::OverflowPolicy;
pub use timestamp::TimestampFormat;
pub use transport::Transport;
pub use worker::{QueuedTransport, DEFAULT_SHUTDOWN_TIMEOUT};
