//! Criterion benchmarks for ema_cross_bot

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ema_cross_bot::prelude::*;
use std::io;
use tempfile::TempDir;

fn sink_console() -> ConsoleTransport {
    ConsoleTransport::with_writers(
        OutputFormat::Human { colors: false },
        Box::new(io::sink()),
        Box::new(io::sink()),
    )
}

fn sample_entry() -> LogEntry {
    LogEntry::new(LogLevel::Info, "GET /health").with_module("http").with_meta(
        Meta::new()
            .with("ip", "127.0.0.1")
            .with("method", "GET")
            .with("query", Meta::new().with("symbol", "BTCUSDT")),
    )
}

// ============================================================================
// Format Pipeline Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let entry = sample_entry();

    group.bench_function("structured", |b| {
        b.iter(|| black_box(OutputFormat::Structured.format(black_box(&entry))));
    });

    group.bench_function("human_plain", |b| {
        let format = OutputFormat::Human { colors: false };
        b.iter(|| black_box(format.format(black_box(&entry))));
    });

    group.bench_function("human_colored", |b| {
        let format = OutputFormat::Human { colors: true };
        b.iter(|| black_box(format.format(black_box(&entry))));
    });

    group.finish();
}

// ============================================================================
// Facade Benchmarks
// ============================================================================

fn bench_console_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("console_logging");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder()
        .min_level(LogLevel::Silly)
        .transport(LogLevel::Silly, sink_console())
        .build()
        .unwrap();

    group.bench_function("info", |b| {
        b.iter(|| logger.info(black_box("Server started")));
    });

    group.bench_function("info_with", |b| {
        b.iter(|| {
            logger.info_with(
                black_box("GET /health"),
                "http",
                Meta::new().with("ip", "127.0.0.1").with("method", "GET"),
            )
        });
    });

    group.finish();
}

fn bench_file_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_logging");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().unwrap();
    let config = LoggerConfig::default()
        .with_log_dir(temp_dir.path())
        .with_queue_capacity(8192);
    let logger = Logger::from_config_with_console(&config, |_| sink_console()).unwrap();

    group.bench_function("error_all_transports", |b| {
        b.iter(|| {
            logger.error_with(
                black_box("Unhandled rejection"),
                "http",
                Meta::new().with("errorMsg", "boom"),
            )
        });
    });

    group.finish();
    logger.flush().unwrap();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    let temp_dir = TempDir::new().unwrap();
    let config = LoggerConfig::default()
        .with_log_dir(temp_dir.path())
        .with_queue_capacity(8192);
    let logger = Logger::from_config_with_console(&config, |_| sink_console()).unwrap();

    for threads in [2, 4] {
        group.throughput(Throughput::Elements(threads * 100));
        group.bench_function(format!("{}_threads", threads), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let logger = logger.clone();
                        std::thread::spawn(move || {
                            for i in 0..100 {
                                logger.info_with("tick", "strategy", Meta::new().with("i", i));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
    logger.flush().unwrap();
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder()
        .min_level(LogLevel::Warn)
        .transport(LogLevel::Warn, sink_console())
        .build()
        .unwrap();

    group.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug(black_box("Filtered message")));
    });

    group.bench_function("enabled_check", |b| {
        b.iter(|| black_box(logger.enabled(black_box(LogLevel::Info))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_formatting,
    bench_console_logging,
    bench_file_logging,
    bench_concurrent_logging,
    bench_level_filtering,
);

criterion_main!(benches);
