//! Logging macros for ergonomic log message formatting.
//!
//! Each macro takes the logger, an optional `module:` tag, optional `meta:`
//! and a `format!`-style message.
//!
//! # Examples
//!
//! ```
//! use ema_cross_bot::prelude::*;
//! use ema_cross_bot::{info, warn};
//!
//! let logger = Logger::builder().build().unwrap();
//!
//! info!(logger, "Server started on port {}", 3000);
//! info!(logger, module: "http", "GET {}", "/health");
//! warn!(logger, module: "strategy", meta: Meta::new().with("ema20", 101.2), "Crossover pending");
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use ema_cross_bot::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use ema_cross_bot::log;
/// log!(logger, LogLevel::Http, "Simple message");
/// log!(logger, LogLevel::Error, module: "http", "Status code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, module: $module:expr, meta: $meta:expr, $($arg:tt)+) => {
        $logger.log_with($level, format!($($arg)+), $module, $meta)
    };
    ($logger:expr, $level:expr, module: $module:expr, $($arg:tt)+) => {
        $logger.log_with($level, format!($($arg)+), $module, $crate::Meta::new())
    };
    ($logger:expr, $level:expr, meta: $meta:expr, $($arg:tt)+) => {
        $logger.log_with($level, format!($($arg)+), "", $meta)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use ema_cross_bot::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use ema_cross_bot::error;
/// error!(logger, module: "http", meta: Meta::new().with("errorMsg", "boom"), "Unhandled rejection");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a warn-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use ema_cross_bot::prelude::*;
/// # let logger = Logger::builder().min_level(LogLevel::Debug).build().unwrap();
/// use ema_cross_bot::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}
