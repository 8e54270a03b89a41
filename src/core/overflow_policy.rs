//! Overflow policies for the per-transport write queues
//!
//! When a file transport's queue is full, these policies determine how
//! the calling thread handles the next entry.

use std::fmt;
use std::time::Duration;

/// Policy for handling a full transport queue
///
/// `error` entries are never dropped: they always wait for queue space,
/// whatever policy is configured.
///
/// # Example
///
/// ```
/// use ema_cross_bot::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: apply backpressure to the caller
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::Block);
///
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Block the caller until the worker frees space
    ///
    /// Last-resort backpressure when the disk cannot keep up; nothing is lost.
    #[default]
    Block,

    /// Block with timeout, then drop
    BlockWithTimeout(Duration),

    /// Drop the entry and alert on stderr
    AlertAndDrop,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::AlertAndDrop => write!(f, "AlertAndDrop"),
        }
    }
}

impl std::str::FromStr for OverflowPolicy {
    type Err = String;

    /// Accepts `block`, `drop`, or `block:<millis>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "block" => Ok(OverflowPolicy::Block),
            "drop" | "alert-and-drop" => Ok(OverflowPolicy::AlertAndDrop),
            other => match other.strip_prefix("block:") {
                Some(ms) => ms
                    .parse::<u64>()
                    .map(|ms| OverflowPolicy::BlockWithTimeout(Duration::from_millis(ms)))
                    .map_err(|_| format!("Invalid block timeout: '{}'", ms)),
                None => Err(format!("Invalid overflow policy: '{}'", other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_default() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
    }

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Block.to_string(), "Block");
        assert_eq!(
            OverflowPolicy::BlockWithTimeout(Duration::from_millis(100)).to_string(),
            "BlockWithTimeout(100ms)"
        );
        assert_eq!(OverflowPolicy::AlertAndDrop.to_string(), "AlertAndDrop");
    }

    #[test]
    fn test_overflow_policy_parse() {
        assert_eq!("block".parse(), Ok(OverflowPolicy::Block));
        assert_eq!("DROP".parse(), Ok(OverflowPolicy::AlertAndDrop));
        assert_eq!(
            "block:250".parse(),
            Ok(OverflowPolicy::BlockWithTimeout(Duration::from_millis(250)))
        );
        assert!("block:soon".parse::<OverflowPolicy>().is_err());
        assert!("spill".parse::<OverflowPolicy>().is_err());
    }
}
