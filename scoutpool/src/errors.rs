//! Error types for scoutpool.
//!
//! Errors fall into three groups:
//!
//! 1. **Read failures** (`FileNotFound`, `PermissionDenied`, `EncodingError`,
//!    `UnknownEncoding`, `IoError`). Inside the worker pool these are recovered
//!    locally: the unit logs them and reports no match for its file.
//! 2. **Caller errors** (`InvalidPattern`, `ConfigError`). These are fatal to a
//!    run and surface from constructors such as `Scanner::new`.
//! 3. **Worker faults** (`WorkerFault`). A unit of execution died abnormally
//!    (an isolated child crashed or replied with garbage, or a thread panicked).
//!    The pool logs and counts these without blocking its siblings.
//!
//! ```rust,ignore
//! match Scanner::new(config) {
//!     Ok(scanner) => // run it,
//!     Err(SearchError::InvalidPattern(p)) => // reject the pattern,
//!     Err(e) => // anything else
//! }
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Malformed {encoding} text in file {}", .path.display())]
    EncodingError { path: PathBuf, encoding: String },
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),
    #[error("Worker fault while scanning {}: {reason}", .path.display())]
    WorkerFault { path: PathBuf, reason: String },
    #[error("Result channel closed")]
    ChannelClosed,
}

/// Canonicalize the path and strip UNC prefixes so that
/// comparisons on Windows are consistent.
pub fn unify_path(original: &Path) -> PathBuf {
    let canonical = original
        .canonicalize()
        .unwrap_or_else(|_| original.to_path_buf());
    strip_unc_prefix(&canonical)
}

/// Strips the Windows UNC prefix (\\?\) from a path if present
fn strip_unc_prefix(p: &Path) -> PathBuf {
    let s = p.display().to_string();
    if let Some(stripped) = s.strip_prefix(r"\\?\") {
        PathBuf::from(stripped)
    } else {
        p.to_path_buf()
    }
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, encoding: impl Into<String>) -> Self {
        let path = path.into();
        Self::EncodingError {
            path: unify_path(&path),
            encoding: encoding.into(),
        }
    }

    pub fn unknown_encoding(label: impl Into<String>) -> Self {
        Self::UnknownEncoding(label.into())
    }

    pub fn worker_fault(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::WorkerFault {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Maps an IO error on `path` to the most specific variant.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
