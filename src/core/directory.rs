//! Log directory lifecycle
//!
//! The directory must exist before any file transport opens a file.

use super::error::{LoggerError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Make sure `path` is an existing directory, creating missing parents
///
/// Idempotent. Fails if the path exists as something other than a
/// directory or if creation is denied.
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(LoggerError::directory(
                path.display().to_string(),
                "path exists and is not a directory",
                None,
            ))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(LoggerError::directory(
                path.display().to_string(),
                "cannot inspect path",
                Some(e),
            ))
        }
    }

    fs::create_dir_all(path).map_err(|e| {
        LoggerError::directory(
            path.display().to_string(),
            "failed to create directory",
            Some(e),
        )
    })
}

/// A log directory known to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirectory {
    path: PathBuf,
}

impl LogDirectory {
    /// Ensure the directory exists and return a handle to it
    pub fn ensure(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_directory(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.path.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("logs");

        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_idempotent() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");

        ensure_directory(&logs).unwrap();
        ensure_directory(&logs).unwrap();

        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_rejects_existing_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("logs");
        fs::write(&file, b"not a directory").unwrap();

        let err = ensure_directory(&file).unwrap_err();
        assert!(matches!(err, LoggerError::DirectoryCreation { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_rejects_file_in_parent_chain() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("blocker");
        fs::write(&file, b"x").unwrap();

        let err = LogDirectory::ensure(file.join("logs")).unwrap_err();
        assert!(matches!(err, LoggerError::DirectoryCreation { .. }));
    }

    #[test]
    fn test_log_directory_join() {
        let dir = tempdir().unwrap();
        let logs = LogDirectory::ensure(dir.path().join("logs")).unwrap();
        assert_eq!(
            logs.join("combined-2025-01-08.log"),
            dir.path().join("logs").join("combined-2025-01-08.log")
        );
    }
}
