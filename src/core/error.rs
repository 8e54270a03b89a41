//! Error types for the logging subsystem

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// The log directory could not be created or is not a directory
    #[error("Cannot prepare log directory '{path}': {message}")]
    DirectoryCreation {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A transport failed to write or flush an entry
    #[error("Transport '{transport}' failed to write: {message}")]
    TransportWrite { transport: String, message: String },

    /// A metadata value could not be represented as JSON
    #[error("Cannot serialize metadata field '{field}': {message}")]
    Serialization { field: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background worker is gone
    #[error("Logger already stopped")]
    LoggerStopped,
}

impl LoggerError {
    /// Create a directory creation error
    pub fn directory(
        path: impl Into<String>,
        message: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        LoggerError::DirectoryCreation {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a transport write error
    pub fn transport_write(transport: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TransportWrite {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(field: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Serialization {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Whether this error must abort process start
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LoggerError::DirectoryCreation { .. } | LoggerError::InvalidConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::directory("logs", "not a directory", None);
        assert!(matches!(err, LoggerError::DirectoryCreation { .. }));

        let err = LoggerError::config("LOG_LEVEL", "unknown level");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::transport_write("combined", "disk full");
        assert!(matches!(err, LoggerError::TransportWrite { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::transport_write("error-file", "Permission denied");
        assert_eq!(
            err.to_string(),
            "Transport 'error-file' failed to write: Permission denied"
        );

        let err = LoggerError::file_rotation("logs/combined-2025-01-08.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for 'logs/combined-2025-01-08.log': Disk full"
        );

        let err = LoggerError::serialization("ratio", "NaN is not valid JSON");
        assert_eq!(
            err.to_string(),
            "Cannot serialize metadata field 'ratio': NaN is not valid JSON"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LoggerError::directory("logs", "denied", None).is_fatal());
        assert!(LoggerError::config("LOG_LEVEL", "bad").is_fatal());
        assert!(!LoggerError::transport_write("console", "closed").is_fatal());
        assert!(!LoggerError::LoggerStopped.is_fatal());
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("compressing log file", "cannot open", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("compressing log file"));
        assert!(err.to_string().contains("cannot open"));
    }
}
