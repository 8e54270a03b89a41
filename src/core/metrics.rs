//! Logger metrics for observability
//!
//! Counters for monitoring logger health: deliveries, failed writes, drops
//! and queue pressure.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use ema_cross_bot::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_write_failure();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.write_failures(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries accepted by the facade (after the level floor)
    accepted: AtomicU64,

    /// Successful transport writes
    delivered: AtomicU64,

    /// Transport writes that failed or panicked
    write_failures: AtomicU64,

    /// Entries discarded by an overflow policy or a stopped worker
    dropped: AtomicU64,

    /// Number of times a queue was full on enqueue
    queue_full_events: AtomicU64,

    /// Number of times a caller blocked waiting for queue space
    block_events: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    /// Each `record_*` returns the previous value
    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of transport writes lost to failures or drops, as a percentage
    ///
    /// Returns 0.0 if nothing has been written yet.
    pub fn loss_rate(&self) -> f64 {
        let lost = (self.write_failures() + self.dropped()) as f64;
        let total = self.delivered() as f64 + lost;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.accepted.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            accepted: AtomicU64::new(self.accepted()),
            delivered: AtomicU64::new(self.delivered()),
            write_failures: AtomicU64::new(self.write_failures()),
            dropped: AtomicU64::new(self.dropped()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
        }
    }
}
