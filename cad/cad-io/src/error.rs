//! Error types for CAD loading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for CAD loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while decoding a CAD file into a document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Unknown format name or file extension.
    #[error("unknown file format: {name}")]
    UnknownFormat {
        /// The unrecognized name or extension.
        name: String,
    },

    /// Recognized format that the kernel cannot decode.
    #[error("{format} files cannot be decoded by the truck kernel")]
    UnsupportedFormat {
        /// Canonical name of the format.
        format: &'static str,
    },

    /// Invalid file content (parse error).
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// The file decoded but holds no shells.
    #[error("document contains no shells")]
    EmptyDocument,

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// JSON decoding error.
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoadError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}
