//! Log level definitions
//!
//! Levels follow the npm severity set. A higher discriminant is more severe,
//! so `entry.level >= threshold` is the delivery test used by every transport.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silly = 0,
    Debug = 1,
    Verbose = 2,
    Http = 3,
    #[default]
    Info = 4,
    Warn = 5,
    Error = 6,
}

impl LogLevel {
    /// All levels from least to most severe
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Silly,
        LogLevel::Debug,
        LogLevel::Verbose,
        LogLevel::Http,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Silly => "silly",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Http => "http",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Whether an entry at this level passes a transport configured with `threshold`
    #[inline]
    pub fn passes(&self, threshold: LogLevel) -> bool {
        *self >= threshold
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Silly => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Verbose => Cyan,
            LogLevel::Http => Magenta,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silly" | "trace" => Ok(LogLevel::Silly),
            "debug" => Ok(LogLevel::Debug),
            "verbose" => Ok(LogLevel::Verbose),
            "http" => Ok(LogLevel::Http),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Warn > LogLevel::Info);
        assert!(LogLevel::Info > LogLevel::Http);
        assert!(LogLevel::Http > LogLevel::Verbose);
        assert!(LogLevel::Verbose > LogLevel::Debug);
        assert!(LogLevel::Debug > LogLevel::Silly);
    }

    #[test]
    fn test_passes_threshold() {
        assert!(LogLevel::Error.passes(LogLevel::Info));
        assert!(LogLevel::Info.passes(LogLevel::Info));
        assert!(!LogLevel::Debug.passes(LogLevel::Info));
        assert!(!LogLevel::Warn.passes(LogLevel::Error));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("trace".parse::<LogLevel>(), Ok(LogLevel::Silly));
        assert_eq!(" Info ".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&LogLevel::Error).unwrap();
        assert_eq!(json, "\"error\"");
        let level: LogLevel = serde_json::from_str("\"http\"").unwrap();
        assert_eq!(level, LogLevel::Http);
    }
}
