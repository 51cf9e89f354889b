//! Centralized error types for mailsift.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailsift library.
///
/// Only three variants ever abort a full-archive parse:
/// [`SiftError::SourceUnavailable`], [`SiftError::MalformedArchive`] and
/// [`SiftError::Cancelled`]. Everything else is recovered locally — a
/// malformed record is dropped, counted, and the stream continues.
#[derive(Error, Debug)]
pub enum SiftError {
    /// The byte source cannot be opened or read.
    #[error("source unavailable '{path}': {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("archive not found: {0}")]
    FileNotFound(PathBuf),

    /// ZIP-level corruption in an OLM container.
    #[error("malformed archive '{path}': {reason}")]
    MalformedArchive { path: PathBuf, reason: String },

    /// A MIME decoding error for a single record.
    #[error("MIME decoding error: {0}")]
    MimeError(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The host cancelled the operation.
    #[error("operation cancelled by host")]
    Cancelled,
}

/// Convenience alias for `Result<T, SiftError>`.
pub type Result<T> = std::result::Result<T, SiftError>;

impl SiftError {
    /// Create a `SourceUnavailable` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// True for the variants that abort a full-archive parse.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::FileNotFound(_)
                | Self::MalformedArchive { .. }
                | Self::Cancelled
        )
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `SiftError`
/// when no path context is available (rare — prefer `SiftError::io`).
impl From<std::io::Error> for SiftError {
    fn from(source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
