use thiserror::Error;

/// Main error type for the corelog logging engine
///
/// None of these ever escape a log call. They are produced by configuration
/// loading, by the file writer (where they are classified and absorbed) and
/// by the CLI.
#[derive(Debug, Error)]
pub enum CorelogError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Invalid log category: {0}")]
    InvalidCategory(String),

    // Log file errors
    #[error("Log write failed: {0}")]
    LogWriteError(String),

    #[error("Log rotation failed: {0}")]
    LogRotationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Lifecycle errors
    #[error("Logging system is in invalid state for this operation: {0}")]
    InvalidState(String),

    #[error("Writer thread error: {0}")]
    WriterThread(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("{0}")]
    Other(String),
}

impl CorelogError {
    /// Classify an I/O failure from the log file.
    ///
    /// Permission failures are kept apart because they disable file logging
    /// for the rest of the process, while anything else only costs one entry.
    pub fn from_file_io(context: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CorelogError::PermissionDenied(format!("{}: {}", context, err))
            }
            _ => CorelogError::LogWriteError(format!("{}: {}", context, err)),
        }
    }

    /// Whether this error must permanently disable the file sink
    pub fn is_permission_error(&self) -> bool {
        match self {
            CorelogError::PermissionDenied(_) => true,
            CorelogError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Result type alias for corelog operations
pub type Result<T> = std::result::Result<T, CorelogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_permission_errors_are_classified() {
        let err = CorelogError::from_file_io(
            "rotate",
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(err.is_permission_error());
        assert!(err.to_string().contains("rotate"));
    }

    #[test]
    fn test_other_io_errors_are_transient() {
        let err = CorelogError::from_file_io("write", io::Error::new(io::ErrorKind::Other, "disk"));
        assert!(!err.is_permission_error());
        assert!(matches!(err, CorelogError::LogWriteError(_)));
    }

    #[test]
    fn test_raw_io_permission_error() {
        let err: CorelogError = io::Error::new(io::ErrorKind::PermissionDenied, "x").into();
        assert!(err.is_permission_error());
    }
}
