//! Logger facade
//!
//! A `Logger` is a cheap, cloneable handle. Build it once at startup and pass
//! it to every collaborator that needs to log. Leveled calls never fail and
//! never panic because of a transport.

use super::{
    directory::LogDirectory,
    error::Result,
    log_entry::LogEntry,
    log_level::LogLevel,
    meta::{Meta, MetaValue},
    metrics::LoggerMetrics,
    overflow_policy::OverflowPolicy,
    transport::Transport,
    worker::{flush_isolated, write_isolated, QueuedTransport, DEFAULT_SHUTDOWN_TIMEOUT},
};
use crate::config::{Destination, LoggerConfig};
use crate::core::OutputFormat;
use crate::transports::{ConsoleTransport, DailyRotateFile};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default capacity of each file transport's write queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

enum Sink {
    /// Written on the caller's thread
    Inline(Mutex<Box<dyn Transport>>),
    /// Written by a background worker
    Queued(QueuedTransport),
}

struct TransportSlot {
    name: String,
    min_level: LogLevel,
    sink: Sink,
}

struct LoggerInner {
    min_level: LogLevel,
    transports: Vec<TransportSlot>,
    metrics: Arc<LoggerMetrics>,
}

impl Drop for LoggerInner {
    fn drop(&mut self) {
        // Queued transports drain and join in their own Drop
        for slot in &self.transports {
            if let Sink::Inline(ref transport) = slot.sink {
                let _ = flush_isolated(transport.lock().as_mut());
            }
        }

        let lost = self.metrics.write_failures() + self.metrics.dropped();
        if lost > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} lost writes (loss rate: {:.2}%)",
                lost,
                self.metrics.loss_rate()
            );
        }
    }
}

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build the standard transport set: console, combined file, error file
    ///
    /// Creates the log directory first; failing to do so is fatal.
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        Self::from_config_with_console(config, ConsoleTransport::new)
    }

    /// Like [`Logger::from_config`], with a caller-supplied console sink
    pub fn from_config_with_console<F>(config: &LoggerConfig, make_console: F) -> Result<Self>
    where
        F: FnOnce(OutputFormat) -> ConsoleTransport,
    {
        let dir = LogDirectory::ensure(&config.log_dir)?;
        let mut make_console = Some(make_console);

        let mut builder = Logger::builder()
            .min_level(config.level)
            .queue_capacity(config.queue_capacity)
            .overflow_policy(config.overflow_policy.clone());

        for transport in config.transports() {
            builder = match transport.destination {
                Destination::Console => {
                    let console = match make_console.take() {
                        Some(make) => make(transport.format),
                        None => ConsoleTransport::new(transport.format),
                    };
                    builder.transport(transport.min_level, console)
                }
                Destination::RotatingFile { pattern, rotation } => {
                    let file = DailyRotateFile::open(dir.join(&pattern), rotation, transport.format)?
                        .with_name(&transport.name);
                    builder.queued_transport(transport.min_level, file)
                }
            };
        }

        builder.build()
    }

    /// Global floor; entries below it never reach any transport
    pub fn min_level(&self) -> LogLevel {
        self.inner.min_level
    }

    /// Whether an entry at `level` would reach at least one transport
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.passes(self.inner.min_level)
            && self
                .inner
                .transports
                .iter()
                .any(|slot| level.passes(slot.min_level))
    }

    /// Names and thresholds of the configured transports
    pub fn transports(&self) -> Vec<(String, LogLevel)> {
        self.inner
            .transports
            .iter()
            .map(|slot| (slot.name.clone(), slot.min_level))
            .collect()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.inner.metrics
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !level.passes(self.inner.min_level) {
            return;
        }
        self.dispatch(LogEntry::new(level, message));
    }

    /// Log with a module tag and metadata
    ///
    /// A string `module` key inside `meta` takes precedence over the
    /// `module` argument and is removed from the metadata.
    pub fn log_with(&self, level: LogLevel, message: impl Into<String>, module: &str, mut meta: Meta) {
        if !level.passes(self.inner.min_level) {
            return;
        }

        let entry = match meta.remove("module") {
            Some(MetaValue::String(from_meta)) => LogEntry::new(level, message).with_module(from_meta),
            Some(other) => {
                meta.insert("module", other);
                LogEntry::new(level, message).with_module(module)
            }
            None => LogEntry::new(level, message).with_module(module),
        };
        self.dispatch(entry.with_meta(meta));
    }

    /// Fan a prepared entry out to every transport whose threshold it meets
    pub fn dispatch(&self, entry: LogEntry) {
        self.inner.metrics.record_accepted();
        let entry = Arc::new(entry);

        for slot in &self.inner.transports {
            if !entry.level.passes(slot.min_level) {
                continue;
            }
            match slot.sink {
                Sink::Inline(ref transport) => {
                    let mut transport = transport.lock();
                    if write_isolated(transport.as_mut(), &entry, &self.inner.metrics) {
                        self.inner.metrics.record_delivered();
                    }
                }
                Sink::Queued(ref queued) => queued.enqueue(Arc::clone(&entry)),
            }
        }
    }

    /// Wait until every transport has written and flushed what was logged so far
    ///
    /// Every transport is flushed even if one fails; the first failure is
    /// returned.
    pub fn flush(&self) -> Result<()> {
        self.flush_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    pub fn flush_timeout(&self, timeout: Duration) -> Result<()> {
        let mut first_error = None;
        for slot in &self.inner.transports {
            let result = match slot.sink {
                Sink::Inline(ref transport) => flush_isolated(transport.lock().as_mut()),
                Sink::Queued(ref queued) => queued.flush(timeout),
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn http(&self, message: impl Into<String>) {
        self.log(LogLevel::Http, message);
    }

    #[inline]
    pub fn verbose(&self, message: impl Into<String>) {
        self.log(LogLevel::Verbose, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn silly(&self, message: impl Into<String>) {
        self.log(LogLevel::Silly, message);
    }

    pub fn error_with(&self, message: impl Into<String>, module: &str, meta: Meta) {
        self.log_with(LogLevel::Error, message, module, meta);
    }

    pub fn warn_with(&self, message: impl Into<String>, module: &str, meta: Meta) {
        self.log_with(LogLevel::Warn, message, module, meta);
    }

    pub fn info_with(&self, message: impl Into<String>, module: &str, meta: Meta) {
        self.log_with(LogLevel::Info, message, module, meta);
    }

    pub fn debug_with(&self, message: impl Into<String>, module: &str, meta: Meta) {
        self.log_with(LogLevel::Debug, message, module, meta);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.inner.min_level)
            .field("transports", &self.transports())
            .finish()
    }
}

/// Builder for constructing a Logger with a fluent API
///
/// # Example
/// ```
/// use ema_cross_bot::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .transport(LogLevel::Debug, ConsoleTransport::new(OutputFormat::Human { colors: false }))
///     .build()
///     .unwrap();
/// logger.debug("ready");
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    queue_capacity: usize,
    overflow_policy: OverflowPolicy,
    pending: Vec<(LogLevel, Box<dyn Transport>, bool)>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            pending: Vec::new(),
        }
    }

    /// Set the global level floor
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Capacity of each queued transport's write queue
    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// What a caller does when a queued transport's queue is full
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Add a transport written synchronously on the caller's thread
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: Transport + 'static>(mut self, min_level: LogLevel, transport: T) -> Self {
        self.pending.push((min_level, Box::new(transport), false));
        self
    }

    /// Add a transport written by its own background worker
    #[must_use = "builder methods return a new value"]
    pub fn queued_transport<T: Transport + 'static>(mut self, min_level: LogLevel, transport: T) -> Self {
        self.pending.push((min_level, Box::new(transport), true));
        self
    }

    /// Build the Logger, starting one worker per queued transport
    pub fn build(self) -> Result<Logger> {
        let metrics = Arc::new(LoggerMetrics::new());
        let mut transports = Vec::with_capacity(self.pending.len());

        for (min_level, transport, queued) in self.pending {
            let name = transport.name().to_string();
            let sink = if queued {
                Sink::Queued(QueuedTransport::spawn(
                    transport,
                    self.queue_capacity,
                    self.overflow_policy.clone(),
                    Arc::clone(&metrics),
                )?)
            } else {
                Sink::Inline(Mutex::new(transport))
            };
            transports.push(TransportSlot {
                name,
                min_level,
                sink,
            });
        }

        Ok(Logger {
            inner: Arc::new(LoggerInner {
                min_level: self.min_level,
                transports,
                metrics,
            }),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerError;

    #[derive(Clone, Default)]
    struct Recorder {
        name: &'static str,
        entries: Arc<Mutex<Vec<LogEntry>>>,
    }

    impl Recorder {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                entries: Arc::default(),
            }
        }

        fn levels(&self) -> Vec<LogLevel> {
            self.entries.lock().iter().map(|e| e.level).collect()
        }
    }

    impl Transport for Recorder {
        fn log(&mut self, entry: &LogEntry) -> Result<()> {
            self.entries.lock().push(entry.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct Failing;

    impl Transport for Failing {
        fn log(&mut self, _entry: &LogEntry) -> Result<()> {
            Err(LoggerError::transport_write("failing", "read-only destination"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_thresholds_route_per_transport() {
        let all = Recorder::named("all");
        let errors = Recorder::named("errors");

        let logger = Logger::builder()
            .min_level(LogLevel::Debug)
            .transport(LogLevel::Debug, all.clone())
            .transport(LogLevel::Error, errors.clone())
            .build()
            .unwrap();

        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");

        assert_eq!(
            all.levels(),
            vec![LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error]
        );
        assert_eq!(errors.levels(), vec![LogLevel::Error]);
    }

    #[test]
    fn test_global_floor_filters_everything() {
        let all = Recorder::named("all");
        let logger = Logger::builder()
            .min_level(LogLevel::Warn)
            .transport(LogLevel::Silly, all.clone())
            .build()
            .unwrap();

        logger.info("dropped");
        logger.warn("kept");

        assert_eq!(all.levels(), vec![LogLevel::Warn]);
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Error));
        assert_eq!(logger.metrics().accepted(), 1);
    }

    #[test]
    fn test_log_with_attaches_module_and_meta() {
        let all = Recorder::named("all");
        let logger = Logger::builder().transport(LogLevel::Info, all.clone()).build().unwrap();

        logger.info_with("GET /health", "http", Meta::new().with("ip", "127.0.0.1"));

        let entries = all.entries.lock();
        assert_eq!(entries[0].module.as_deref(), Some("http"));
        assert_eq!(entries[0].meta.get("ip"), Some(&MetaValue::from("127.0.0.1")));
    }

    #[test]
    fn test_module_in_meta_overrides_argument() {
        let all = Recorder::named("all");
        let logger = Logger::builder().transport(LogLevel::Info, all.clone()).build().unwrap();

        logger.info_with("tick", "general", Meta::new().with("module", "strategy").with("n", 1));

        let entries = all.entries.lock();
        assert_eq!(entries[0].module.as_deref(), Some("strategy"));
        assert!(entries[0].meta.get("module").is_none());
        assert_eq!(entries[0].meta.len(), 1);
    }

    #[test]
    fn test_failing_transport_does_not_block_others() {
        let all = Recorder::named("all");
        let logger = Logger::builder()
            .transport(LogLevel::Info, Failing)
            .transport(LogLevel::Info, all.clone())
            .build()
            .unwrap();

        logger.error("still delivered");

        assert_eq!(all.levels(), vec![LogLevel::Error]);
        assert_eq!(logger.metrics().write_failures(), 1);
        assert_eq!(logger.metrics().delivered(), 1);
    }

    #[test]
    fn test_queued_transport_flush() {
        let file_like = Recorder::named("combined");
        let logger = Logger::builder()
            .queue_capacity(2)
            .queued_transport(LogLevel::Info, file_like.clone())
            .build()
            .unwrap();

        for i in 0..25 {
            logger.info(format!("entry {}", i));
        }
        logger.flush().unwrap();

        assert_eq!(file_like.entries.lock().len(), 25);
        assert_eq!(logger.metrics().dropped(), 0);
    }

    #[test]
    fn test_clones_share_transports() {
        let all = Recorder::named("all");
        let logger = Logger::builder().transport(LogLevel::Info, all.clone()).build().unwrap();
        let handle = logger.clone();

        logger.info("one");
        handle.info("two");

        assert_eq!(all.entries.lock().len(), 2);
        assert_eq!(handle.transports(), vec![("all".to_string(), LogLevel::Info)]);
    }

    #[test]
    fn test_zero_queue_capacity_fails_build() {
        let result = Logger::builder()
            .queue_capacity(0)
            .queued_transport(LogLevel::Info, Recorder::named("combined"))
            .build();
        assert!(result.is_err());
    }
}
