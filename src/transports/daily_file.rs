//! Daily rotating file transport
//!
//! Files are named from a pattern containing `%DATE%`, e.g.
//! `logs/combined-%DATE%.log` becomes `logs/combined-2025-01-08.log`. A new
//! file is opened when the day of the entry being written changes or when the
//! current file reaches its size cap. Closed files can be gzip-compressed and
//! files older than the retention window are deleted.

use crate::core::{LogEntry, LoggerError, OutputFormat, Result, Transport};
use chrono::{Local, NaiveDate};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the formatted date in a file pattern
pub const DATE_PLACEHOLDER: &str = "%DATE%";

const WRITE_BUFFER_SIZE: usize = 16 * 1024;
const COMPRESS_BUFFER_SIZE: usize = 64 * 1024;

/// When and how a daily file is rotated
///
/// # Examples
///
/// ```
/// use ema_cross_bot::transports::RotationPolicy;
///
/// // 100 MB per file, two weeks of history, gzip closed files
/// let policy = RotationPolicy::new()
///     .with_max_size(100 * 1024 * 1024)
///     .with_max_days(14)
///     .with_compression(true);
/// assert_eq!(policy.date_pattern, "%Y-%m-%d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// chrono format for the date part of file names
    pub date_pattern: String,
    /// Size cap in bytes; `None` rotates on day change only
    pub max_size: Option<u64>,
    /// Files dated this many days or more before the active day are deleted
    pub max_days: Option<u32>,
    /// Gzip files once they are rotated out
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            date_pattern: "%Y-%m-%d".to_string(),
            max_size: None,
            max_days: None,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = pattern.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_days(mut self, days: u32) -> Self {
        self.max_days = Some(days);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Parse a size such as `"100m"`, `"512k"`, `"1g"` or a plain byte count
    pub fn parse_size(value: &str) -> Result<u64> {
        let value = value.trim().to_ascii_lowercase();
        let (digits, multiplier) = match value.chars().last() {
            Some('k') => (&value[..value.len() - 1], 1024),
            Some('m') => (&value[..value.len() - 1], 1024 * 1024),
            Some('g') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
            _ => (value.as_str(), 1),
        };

        digits
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .filter(|n| *n > 0)
            .ok_or_else(|| LoggerError::config("max_size", format!("invalid size '{}'", value)))
    }
}

/// File name template split around `%DATE%`
#[derive(Debug, Clone)]
struct FilePattern {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl FilePattern {
    fn parse(pattern: &Path) -> Result<Self> {
        let file_name = pattern
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                LoggerError::config("file pattern", format!("'{}' has no file name", pattern.display()))
            })?;

        let (prefix, suffix) = file_name.split_once(DATE_PLACEHOLDER).ok_or_else(|| {
            LoggerError::config(
                "file pattern",
                format!("'{}' does not contain {}", file_name, DATE_PLACEHOLDER),
            )
        })?;

        let dir = match pattern.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            dir,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// `combined-2025-01-08.log` for sequence 0, `combined-2025-01-08.log.2` for 2
    fn path(&self, date_key: &str, sequence: u32) -> PathBuf {
        let mut name = format!("{}{}{}", self.prefix, date_key, self.suffix);
        if sequence > 0 {
            name.push_str(&format!(".{}", sequence));
        }
        self.dir.join(name)
    }

    /// Extract the date string of a file belonging to this pattern
    fn date_part<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let rest = file_name.strip_prefix(self.prefix.as_str())?;
        if self.suffix.is_empty() {
            return rest.split('.').next();
        }
        rest.find(self.suffix.as_str()).map(|idx| &rest[..idx])
    }

    /// Sequence number and archive flag of a file for `date_key`
    fn sequence_of(&self, file_name: &str, date_key: &str) -> Option<(u32, bool)> {
        let base = format!("{}{}{}", self.prefix, date_key, self.suffix);
        let rest = file_name.strip_prefix(base.as_str())?;
        let (rest, archived) = match rest.strip_suffix(".gz") {
            Some(stripped) => (stripped, true),
            None => (rest, false),
        };

        if rest.is_empty() {
            return Some((0, archived));
        }
        rest.strip_prefix('.')?
            .parse::<u32>()
            .ok()
            .map(|n| (n, archived))
    }
}

/// Rotating file transport keyed by calendar day
///
/// # Examples
///
/// ```no_run
/// use ema_cross_bot::prelude::*;
/// use ema_cross_bot::transports::{DailyRotateFile, RotationPolicy};
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_days(30)
///     .with_compression(true);
/// let file = DailyRotateFile::open("logs/error-%DATE%.log", policy, OutputFormat::Structured)
///     .unwrap()
///     .with_name("error");
/// ```
pub struct DailyRotateFile {
    name: String,
    pattern: FilePattern,
    policy: RotationPolicy,
    format: OutputFormat,
    active_date: NaiveDate,
    sequence: u32,
    current_path: PathBuf,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl DailyRotateFile {
    /// Open today's file for `pattern`
    ///
    /// The pattern's directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern has no `%DATE%` or the file cannot be opened
    pub fn open(pattern: impl AsRef<Path>, policy: RotationPolicy, format: OutputFormat) -> Result<Self> {
        Self::open_for_date(pattern, policy, format, Local::now().date_naive())
    }

    /// Open the file for `date`, resuming its latest size successor if any
    pub fn open_for_date(
        pattern: impl AsRef<Path>,
        policy: RotationPolicy,
        format: OutputFormat,
        date: NaiveDate,
    ) -> Result<Self> {
        let pattern = FilePattern::parse(pattern.as_ref())?;
        let name = pattern
            .prefix
            .trim_end_matches(|c: char| c == '-' || c == '_' || c == '.')
            .to_string();
        let name = if name.is_empty() { "file".to_string() } else { name };

        let mut transport = Self {
            name,
            pattern,
            policy,
            format,
            active_date: date,
            sequence: 0,
            current_path: PathBuf::new(),
            writer: None,
            current_size: 0,
        };

        let date_key = transport.date_key(date);
        let sequence = transport.resume_sequence(&date_key);
        let (writer, size, path) = transport.open_file(&date_key, sequence)?;

        transport.sequence = sequence;
        transport.current_path = path;
        transport.writer = Some(writer);
        transport.current_size = size;
        transport.purge_expired();

        Ok(transport)
    }

    /// Override the transport name (defaults to the file prefix)
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn active_date(&self) -> NaiveDate {
        self.active_date
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn date_key(&self, date: NaiveDate) -> String {
        date.format(&self.policy.date_pattern).to_string()
    }

    /// First sequence for `date_key` that is safe to append to
    fn resume_sequence(&self, date_key: &str) -> u32 {
        let mut plain: Option<u32> = None;
        let mut archived: Option<u32> = None;

        if let Ok(entries) = fs::read_dir(&self.pattern.dir) {
            for entry in entries.flatten() {
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    continue;
                };
                match self.pattern.sequence_of(file_name, date_key) {
                    Some((n, false)) => plain = plain.max(Some(n)),
                    Some((n, true)) => archived = archived.max(Some(n)),
                    None => {}
                }
            }
        }

        match (plain, archived) {
            (Some(p), Some(a)) if a >= p => a + 1,
            (Some(p), _) => p,
            (None, Some(a)) => a + 1,
            (None, None) => 0,
        }
    }

    fn open_file(&self, date_key: &str, sequence: u32) -> Result<(BufWriter<File>, u64, PathBuf)> {
        let path = self.pattern.path(date_key, sequence);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "open log file",
                    format!("Failed to open '{}'", path.display()),
                    e,
                )
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::io_operation(
                    "open log file",
                    format!("Cannot access metadata of '{}'", path.display()),
                    e,
                )
            })?
            .len();

        Ok((BufWriter::with_capacity(WRITE_BUFFER_SIZE, file), size, path))
    }

    fn size_exceeded(&self) -> bool {
        match self.policy.max_size {
            Some(max) => self.current_size > 0 && self.current_size >= max,
            None => false,
        }
    }

    /// Switch to the file for (`date`, `sequence`)
    ///
    /// The new file is opened before the old one is closed, so a failure
    /// leaves the transport writing where it was.
    fn rotate_to(&mut self, date: NaiveDate, sequence: Option<u32>) -> Result<()> {
        let date_key = self.date_key(date);
        let sequence = sequence.unwrap_or_else(|| self.resume_sequence(&date_key));

        let (writer, size, path) = self.open_file(&date_key, sequence).map_err(|e| {
            LoggerError::file_rotation(self.current_path.display().to_string(), e.to_string())
        })?;

        if let Some(mut old) = self.writer.replace(writer) {
            if let Err(e) = old.flush() {
                eprintln!(
                    "[LOGGER ERROR] Failed to flush '{}' before rotation: {}",
                    self.current_path.display(),
                    e
                );
            }
        }

        let old_path = std::mem::replace(&mut self.current_path, path);
        self.active_date = date;
        self.sequence = sequence;
        self.current_size = size;

        if self.policy.compress && old_path != self.current_path {
            if let Err(e) = compress_file(&old_path) {
                eprintln!("[LOGGER WARNING] {}", e);
            }
        }
        self.purge_expired();

        Ok(())
    }

    fn discard_buffered(&mut self) {
        if let Some(writer) = self.writer.take() {
            let (file, _lost) = writer.into_parts();
            self.writer = Some(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file));
        }
    }

    /// Delete this transport's files older than the retention window
    ///
    /// Returns the number of files removed.
    pub fn purge_expired(&mut self) -> usize {
        let Some(max_days) = self.policy.max_days else {
            return 0;
        };
        let Ok(entries) = fs::read_dir(&self.pattern.dir) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path == self.current_path {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(date) = self
                .pattern
                .date_part(file_name)
                .and_then(|part| NaiveDate::parse_from_str(part, &self.policy.date_pattern).ok())
            else {
                continue;
            };

            if (self.active_date - date).num_days() >= i64::from(max_days) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => eprintln!(
                        "[LOGGER WARNING] Failed to remove expired log '{}': {}",
                        path.display(),
                        e
                    ),
                }
            }
        }
        removed
    }
}

impl Transport for DailyRotateFile {
    fn log(&mut self, entry: &LogEntry) -> Result<()> {
        let entry_date = entry.timestamp.date_naive();

        let rotation = if entry_date > self.active_date {
            Some(self.rotate_to(entry_date, None))
        } else if self.size_exceeded() {
            Some(self.rotate_to(self.active_date, Some(self.sequence + 1)))
        } else {
            None
        };

        if let Some(Err(e)) = rotation {
            eprintln!("[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.", e);
            // Stop retrying the size cap on every write until the next day
            self.current_size = 0;
        }

        let mut line = self.format.format(entry);
        line.push('\n');

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::transport_write(&self.name, "writer not initialized"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::transport_write(
                &self.name,
                format!("Failed to write to '{}': {}", self.current_path.display(), e),
            )
        })?;
        self.current_size += line.len() as u64;
        Ok(())
    }

    /// Flush buffered lines to disk
    ///
    /// On failure the unwritten bytes are discarded, so lines reported lost
    /// are never written later.
    fn flush(&mut self) -> Result<()> {
        let Some(ref mut writer) = self.writer else {
            return Ok(());
        };
        if let Err(e) = writer.flush() {
            self.discard_buffered();
            return Err(LoggerError::transport_write(
                &self.name,
                format!("Failed to flush '{}': {}", self.current_path.display(), e),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for DailyRotateFile {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(extension);
    PathBuf::from(name)
}

/// Gzip `path` to `<path>.gz`, removing the original only on success
///
/// Streams through `<path>.gz.tmp` and renames it into place.
pub fn compress_file(path: &Path) -> Result<PathBuf> {
    use flate2::{write::GzEncoder, Compression};
    use std::io::{BufReader, Read};

    let gz_path = with_appended_extension(path, ".gz");
    let temp_gz_path = with_appended_extension(path, ".gz.tmp");

    let compress_error = |message: String, e: std::io::Error| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation("compress log file", message, e)
    };

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open '{}' for compression", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(COMPRESS_BUFFER_SIZE, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        compress_error(format!("Failed to create '{}'", temp_gz_path.display()), e)
    })?;
    let mut encoder = GzEncoder::new(
        BufWriter::with_capacity(COMPRESS_BUFFER_SIZE, output),
        Compression::default(),
    );

    let mut buffer = vec![0u8; COMPRESS_BUFFER_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| compress_error(format!("Failed to read '{}'", path.display()), e))?;
        if bytes_read == 0 {
            break;
        }
        encoder
            .write_all(&buffer[..bytes_read])
            .map_err(|e| compress_error("Failed to compress data chunk".to_string(), e))?;
    }

    let mut output = encoder
        .finish()
        .map_err(|e| compress_error("Failed to finish compression".to_string(), e))?;
    output
        .flush()
        .map_err(|e| compress_error("Failed to flush compressed file".to_string(), e))?;
    drop(output);

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        compress_error(format!("Failed to rename to '{}'", gz_path.display()), e)
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed '{}' but failed to remove the original: {}",
            path.display(),
            e
        );
    }

    Ok(gz_path)
}
