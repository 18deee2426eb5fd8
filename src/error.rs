// Error types for rback

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("unable to start `{command}`: {source}")]
    CommandUnavailable {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("`{command}` did not finish within {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("I/O error on {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to find archive at '{}': {source}", .path.display())]
    ArchiveNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{field} value is {len} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} value '{value}' contains the archive delimiter")]
    InvalidField { field: &'static str, value: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        AppError::Io {
            context: context.into(),
            source,
        }
    }

    /// Short operator hint printed under the error line, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Usage(_) => Some("run with --help for usage"),
            AppError::CommandUnavailable { .. } => {
                Some("make sure the route command (net-tools) is installed and on PATH")
            }
            AppError::CommandTimeout { .. } => Some("raise the limit with --timeout"),
            AppError::Io { .. } => Some("check the target directory exists and is writable"),
            AppError::ArchiveNotFound { .. } => Some("pass the archive location with -f"),
            AppError::FieldTooLong { .. } | AppError::InvalidField { .. } => {
                Some("the routing table output does not have the expected column layout")
            }
            AppError::Config(_) => Some("check your config file or command-line arguments"),
            AppError::CommandFailed { .. } | AppError::Serialization(_) => None,
        }
    }

    /// Every error is terminal and maps to the same status
    pub fn exit_code(&self) -> u8 {
        1
    }
}
