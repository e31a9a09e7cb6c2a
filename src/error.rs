//! Centralized error types for skypeshell.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the skypeshell library.
#[derive(Error, Debug)]
pub enum SkypeError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file or directory does not exist.
    #[error("File or directory not found: {0}")]
    FileNotFound(PathBuf),

    /// A directory was given but it holds no `messages.json`.
    #[error("messages.json not found in directory: {0}")]
    ArchiveNotFound(PathBuf),

    /// The archive is not valid JSON or does not have the expected shape.
    #[error("Failed to parse JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A user-supplied date string matched none of the accepted formats.
    #[error("Unable to parse date: {0}")]
    InvalidDate(String),

    /// A 1-based conversation number outside `1..=count`.
    #[error("Invalid conversation number: {number} (valid range: 1-{count})")]
    ConversationOutOfRange { number: usize, count: usize },

    /// A search observed its cancellation token.
    #[error("Search cancelled")]
    Cancelled,

    /// An export or conversion failed.
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Convenience alias for `Result<T, SkypeError>`.
pub type Result<T> = std::result::Result<T, SkypeError>;

impl SkypeError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Json` variant from a path and a `serde_json::Error`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
