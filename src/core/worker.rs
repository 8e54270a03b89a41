//! Background write queue for one transport
//!
//! The caller enqueues an `Arc<LogEntry>` and returns; a dedicated thread
//! drains the bounded queue in batches, writes each entry, then flushes.
//! Rotation inside the transport therefore always happens between two whole
//! entries.
//!
//! An entry counts as delivered only once the flush after its batch succeeds.
//! A failed flush turns every entry written since the last good flush into a
//! write failure and is reported back to whoever asked for the flush.

use super::{
    error::{LoggerError, Result},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    overflow_policy::OverflowPolicy,
    transport::Transport,
};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for draining a queue when its handle is dropped
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const BATCH_SIZE: usize = 64;

enum Command {
    Entry(Arc<LogEntry>),
    Flush(Sender<std::result::Result<(), String>>),
}

/// A transport running on its own worker thread
pub struct QueuedTransport {
    name: String,
    sender: Option<Sender<Command>>,
    handle: Option<thread::JoinHandle<()>>,
    overflow_policy: OverflowPolicy,
    metrics: Arc<LoggerMetrics>,
}

impl QueuedTransport {
    /// Move `transport` onto a new worker thread fed by a queue of `capacity`
    pub fn spawn(
        transport: Box<dyn Transport>,
        capacity: usize,
        overflow_policy: OverflowPolicy,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(LoggerError::config(
                "queue_capacity",
                "queue capacity must be at least 1",
            ));
        }

        let name = transport.name().to_string();
        let (sender, receiver) = bounded(capacity);
        let worker_metrics = Arc::clone(&metrics);

        let handle = thread::Builder::new()
            .name(format!("log-{}", name))
            .spawn(move || Self::run(transport, receiver, worker_metrics))
            .map_err(|e| {
                LoggerError::io_operation("spawning log worker", format!("transport '{}'", name), e)
            })?;

        Ok(Self {
            name,
            sender: Some(sender),
            handle: Some(handle),
            overflow_policy,
            metrics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn run(mut transport: Box<dyn Transport>, receiver: Receiver<Command>, metrics: Arc<LoggerMetrics>) {
        let mut batch = Vec::with_capacity(BATCH_SIZE);
        let mut acks: Vec<Sender<std::result::Result<(), String>>> = Vec::new();
        // Written into the transport but not yet flushed
        let mut pending: u64 = 0;

        // Blocks until an entry arrives or every sender is gone
        while let Ok(first) = receiver.recv() {
            batch.push(first);
            while batch.len() < BATCH_SIZE {
                match receiver.try_recv() {
                    Ok(command) => batch.push(command),
                    Err(_) => break,
                }
            }

            for command in batch.drain(..) {
                match command {
                    Command::Entry(entry) => {
                        if write_isolated(transport.as_mut(), &entry, &metrics) {
                            pending += 1;
                        }
                    }
                    Command::Flush(ack) => acks.push(ack),
                }
            }

            let outcome = flush_isolated(transport.as_mut());
            settle(&metrics, std::mem::take(&mut pending), &outcome);
            let outcome = outcome.map_err(|e| failure_reason(&e));
            for ack in acks.drain(..) {
                let _ = ack.send(outcome.clone());
            }
        }

        let outcome = flush_isolated(transport.as_mut());
        settle(&metrics, pending, &outcome);
    }

    /// Queue an entry for the worker; never fails from the caller's view
    pub fn enqueue(&self, entry: Arc<LogEntry>) {
        let Some(ref sender) = self.sender else {
            self.metrics.record_dropped();
            return;
        };

        match sender.try_send(Command::Entry(entry)) {
            Ok(()) => {}
            Err(TrySendError::Full(Command::Entry(entry))) => self.handle_overflow(sender, entry),
            Err(TrySendError::Full(Command::Flush(_))) => {}
            Err(TrySendError::Disconnected(_)) => {
                self.metrics.record_dropped();
            }
        }
    }

    fn handle_overflow(&self, sender: &Sender<Command>, entry: Arc<LogEntry>) {
        self.metrics.record_queue_full();

        // Errors are never dropped
        let policy = if entry.level == LogLevel::Error {
            &OverflowPolicy::Block
        } else {
            &self.overflow_policy
        };

        match policy {
            OverflowPolicy::Block => {
                self.metrics.record_block();
                if sender.send(Command::Entry(entry)).is_err() {
                    self.metrics.record_dropped();
                }
            }

            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.metrics.record_block();
                match sender.send_timeout(Command::Entry(entry), *timeout) {
                    Ok(()) => {}
                    Err(SendTimeoutError::Timeout(_)) => self.alert_and_drop(),
                    Err(SendTimeoutError::Disconnected(_)) => {
                        self.metrics.record_dropped();
                    }
                }
            }

            OverflowPolicy::AlertAndDrop => self.alert_and_drop(),
        }
    }

    fn alert_and_drop(&self) {
        let dropped_count = self.metrics.record_dropped();

        // Alert on first drop and periodically thereafter
        if dropped_count == 0 || (dropped_count + 1) % 1000 == 0 {
            eprintln!(
                "[LOGGER WARNING] Queue for transport '{}' full, {} logs dropped. \
                 Consider a larger queue or the Block overflow policy.",
                self.name,
                dropped_count + 1
            );
        }
    }

    /// Wait until everything queued before this call is written and flushed
    ///
    /// # Errors
    ///
    /// Returns `TransportWrite` if the worker's flush failed or did not
    /// answer within `timeout`.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(LoggerError::LoggerStopped)?;
        let (ack_tx, ack_rx) = bounded(1);

        sender
            .send_timeout(Command::Flush(ack_tx), timeout)
            .map_err(|_| LoggerError::transport_write(&self.name, "flush request timed out"))?;
        match ack_rx.recv_timeout(timeout) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(LoggerError::transport_write(&self.name, reason)),
            Err(_) => Err(LoggerError::transport_write(&self.name, "flush not acknowledged")),
        }
    }

    /// Close the queue and wait for the worker to drain it
    ///
    /// Returns `true` if the worker finished within `timeout`.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if handle.join().is_err() {
                    eprintln!(
                        "[LOGGER ERROR] Worker for transport '{}' panicked during shutdown",
                        self.name
                    );
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Worker for transport '{}' did not finish within {:?}. \
                     Some logs may be lost.",
                    self.name, timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for QueuedTransport {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// Write one entry, containing both errors and panics to this transport
///
/// Returns `true` if the transport accepted the entry. Failures are counted
/// here; deliveries are counted by the caller.
pub(crate) fn write_isolated(transport: &mut dyn Transport, entry: &LogEntry, metrics: &LoggerMetrics) -> bool {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| transport.log(entry)));

    match result {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            eprintln!(
                "[LOGGER ERROR] Transport '{}' failed: {}. Entry dropped: {}",
                transport.name(),
                e,
                entry.message
            );
            metrics.record_write_failure();
            false
        }
        Err(panic_info) => {
            eprintln!(
                "[LOGGER CRITICAL] Transport '{}' panicked: {}. \
                 Other transports continue to function.",
                transport.name(),
                panic_message(panic_info.as_ref())
            );
            metrics.record_write_failure();
            false
        }
    }
}

/// Flush one transport, turning a panic into an error
pub(crate) fn flush_isolated(transport: &mut dyn Transport) -> Result<()> {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| transport.flush()));

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            eprintln!("[LOGGER ERROR] Transport '{}' flush failed: {}", transport.name(), e);
            Err(e)
        }
        Err(panic_info) => {
            let message = panic_message(panic_info.as_ref());
            eprintln!(
                "[LOGGER CRITICAL] Transport '{}' panicked during flush: {}",
                transport.name(),
                message
            );
            Err(LoggerError::transport_write(
                transport.name(),
                format!("panicked during flush: {}", message),
            ))
        }
    }
}

/// Account for `pending` unflushed entries once the flush outcome is known
fn settle(metrics: &LoggerMetrics, pending: u64, outcome: &Result<()>) {
    for _ in 0..pending {
        if outcome.is_ok() {
            metrics.record_delivered();
        } else {
            metrics.record_write_failure();
        }
    }
}

fn failure_reason(err: &LoggerError) -> String {
    match err {
        LoggerError::TransportWrite { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
