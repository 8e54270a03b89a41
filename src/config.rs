//! Startup configuration
//!
//! Everything is read once at boot. `from_env` reads the process
//! environment; `from_lookup` takes any key lookup so tests stay hermetic.

use crate::core::{LogLevel, LoggerError, OutputFormat, OverflowPolicy, Result, DEFAULT_QUEUE_CAPACITY};
use crate::transports::RotationPolicy;
use std::path::PathBuf;

/// Where a transport writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// stdout, with `error` entries on stderr
    Console,
    /// Daily rotating file; `pattern` is a file name containing `%DATE%`
    RotatingFile {
        pattern: String,
        rotation: RotationPolicy,
    },
}

/// One row of the transport table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub name: String,
    pub min_level: LogLevel,
    pub format: OutputFormat,
    pub destination: Destination,
}

/// Logger configuration
///
/// # Example
///
/// ```
/// use ema_cross_bot::config::LoggerConfig;
/// use ema_cross_bot::LogLevel;
///
/// let config = LoggerConfig::default()
///     .with_log_dir("/var/log/ema-bot")
///     .with_level(LogLevel::Debug);
///
/// let names: Vec<_> = config.transports().into_iter().map(|t| t.name).collect();
/// assert_eq!(names, ["console", "combined", "error"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    /// Threshold for the console and combined file, and the global floor
    pub level: LogLevel,
    pub colors: bool,
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    pub combined: RotationPolicy,
    pub error: RotationPolicy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            level: LogLevel::Info,
            colors: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::Block,
            combined: RotationPolicy::new()
                .with_max_size(100 * 1024 * 1024)
                .with_max_days(14)
                .with_compression(true),
            error: RotationPolicy::new()
                .with_max_size(50 * 1024 * 1024)
                .with_max_days(30)
                .with_compression(true),
        }
    }
}

impl LoggerConfig {
    /// Read `LOG_LEVEL`, `LOG_DIR`, `LOG_COLORS`, `NO_COLOR`,
    /// `LOG_QUEUE_CAPACITY` and `LOG_OVERFLOW` from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = get("LOG_LEVEL") {
            config.level = level
                .parse()
                .map_err(|e: String| LoggerError::config("LOG_LEVEL", e))?;
        }

        if let Some(dir) = get("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Some(colors) = get("LOG_COLORS") {
            config.colors = parse_bool(&colors)
                .ok_or_else(|| LoggerError::config("LOG_COLORS", format!("expected a boolean, got '{}'", colors)))?;
        }
        if lookup("NO_COLOR").is_some() {
            config.colors = false;
        }

        if let Some(capacity) = get("LOG_QUEUE_CAPACITY") {
            config.queue_capacity = capacity
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    LoggerError::config("LOG_QUEUE_CAPACITY", format!("expected a positive integer, got '{}'", capacity))
                })?;
        }

        if let Some(policy) = get("LOG_OVERFLOW") {
            config.overflow_policy = policy
                .parse()
                .map_err(|e: String| LoggerError::config("LOG_OVERFLOW", e))?;
        }

        Ok(config)
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_combined_rotation(mut self, policy: RotationPolicy) -> Self {
        self.combined = policy;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_error_rotation(mut self, policy: RotationPolicy) -> Self {
        self.error = policy;
        self
    }

    /// The fixed transport table: console, combined file, error file
    pub fn transports(&self) -> Vec<TransportConfig> {
        vec![
            TransportConfig {
                name: "console".to_string(),
                min_level: self.level,
                format: OutputFormat::Human { colors: self.colors },
                destination: Destination::Console,
            },
            TransportConfig {
                name: "combined".to_string(),
                min_level: self.level,
                format: OutputFormat::Structured,
                destination: Destination::RotatingFile {
                    pattern: "combined-%DATE%.log".to_string(),
                    rotation: self.combined.clone(),
                },
            },
            TransportConfig {
                name: "error".to_string(),
                min_level: LogLevel::Error,
                format: OutputFormat::Structured,
                destination: Destination::RotatingFile {
                    pattern: "error-%DATE%.log".to_string(),
                    rotation: self.error.clone(),
                },
            },
        ]
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Read `PORT` and `HOST` from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| LoggerError::config("PORT", format!("invalid port '{}'", port)))?;
        }
        if let Some(host) = lookup("HOST").filter(|v| !v.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        Ok(config)
    }

    /// `host:port` suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(config.colors);
        assert_eq!(config.combined.max_size, Some(100 * 1024 * 1024));
        assert_eq!(config.combined.max_days, Some(14));
        assert_eq!(config.error.max_size, Some(50 * 1024 * 1024));
        assert_eq!(config.error.max_days, Some(30));
        assert!(config.combined.compress && config.error.compress);
    }

    #[test]
    fn test_env_overrides() {
        let config = LoggerConfig::from_lookup(lookup(&[
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_DIR", "/tmp/ema"),
            ("LOG_COLORS", "false"),
            ("LOG_QUEUE_CAPACITY", "64"),
            ("LOG_OVERFLOW", "drop"),
        ]))
        .unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/ema"));
        assert!(!config.colors);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.overflow_policy, OverflowPolicy::AlertAndDrop);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = LoggerConfig::from_lookup(lookup(&[("LOG_LEVEL", ""), ("LOG_DIR", "  ")])).unwrap();
        assert_eq!(config, LoggerConfig::default());
    }

    #[test]
    fn test_no_color_disables_colors() {
        let config = LoggerConfig::from_lookup(lookup(&[("NO_COLOR", "")])).unwrap();
        assert!(!config.colors);
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        let err = LoggerConfig::from_lookup(lookup(&[("LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_transport_table() {
        let config = LoggerConfig::default().with_level(LogLevel::Warn).with_colors(false);
        let transports = config.transports();

        assert_eq!(transports[0].min_level, LogLevel::Warn);
        assert_eq!(transports[0].format, OutputFormat::Human { colors: false });
        assert_eq!(transports[0].destination, Destination::Console);

        assert_eq!(transports[1].min_level, LogLevel::Warn);
        assert_eq!(transports[1].format, OutputFormat::Structured);

        assert_eq!(transports[2].min_level, LogLevel::Error);
        match &transports[2].destination {
            Destination::RotatingFile { pattern, rotation } => {
                assert_eq!(pattern, "error-%DATE%.log");
                assert_eq!(rotation.max_days, Some(30));
            }
            other => panic!("unexpected destination {:?}", other),
        }
    }

    #[test]
    fn test_server_config() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");

        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080"), ("HOST", "127.0.0.1")])).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");

        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }
}
