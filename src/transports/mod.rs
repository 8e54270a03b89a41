//! Transport implementations

pub mod console;
pub mod daily_file;

pub use console::ConsoleTransport;
pub use daily_file::{compress_file, DailyRotateFile, RotationPolicy, DATE_PLACEHOLDER};

pub use crate::core::Transport;
