//! Path error types.
//!
//! Two layers: [`PathError`] is what callers of the facade see, and
//! [`StoreError`] is what remote collaborators report. Backends translate the
//! latter into the former at their boundary so no collaborator error type
//! escapes through [`crate::Path`].

use std::io;
use thiserror::Error;

use crate::types::BackendKind;

/// Path error type.
#[derive(Debug, Error)]
pub enum PathError {
    /// No registered backend owns the path's prefix.
    #[error("unsupported path kind: {0}")]
    UnsupportedPathKind(String),

    /// Dataset, collection, object or file not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Directory not empty.
    #[error("directory not empty: {0}")]
    NotEmpty(String),

    /// Operation not meaningful for this backend.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No transfer strategy for this pair of backends.
    #[error("unsupported copy operation: {from} -> {to}")]
    UnsupportedCopyOperation { from: BackendKind, to: BackendKind },

    /// Malformed path (missing dataset, wrong scheme).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Bad registry or config input.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PathError {
    /// Create an UnsupportedPathKind error.
    pub fn unsupported_path_kind(path: impl Into<String>) -> Self {
        Self::UnsupportedPathKind(path.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a NotEmpty error.
    pub fn not_empty(path: impl Into<String>) -> Self {
        Self::NotEmpty(path.into())
    }

    /// Create an UnsupportedOperation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Translate a local I/O error, keeping the kinds that carry domain meaning.
    pub fn from_io(err: io::Error, path: impl Into<String>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.into()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.into()),
            io::ErrorKind::DirectoryNotEmpty => Self::NotEmpty(path.into()),
            _ => Self::Io(err),
        }
    }
}

/// Convert PathError to std::io::Error for compatibility.
impl From<PathError> for io::Error {
    fn from(e: PathError) -> Self {
        match e {
            PathError::UnsupportedPathKind(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            PathError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            PathError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            PathError::NotEmpty(msg) => io::Error::new(io::ErrorKind::DirectoryNotEmpty, msg),
            PathError::UnsupportedOperation(msg) => {
                io::Error::new(io::ErrorKind::Unsupported, msg)
            }
            PathError::UnsupportedCopyOperation { from, to } => io::Error::new(
                io::ErrorKind::Unsupported,
                format!("copy {from} -> {to}"),
            ),
            PathError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            PathError::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            PathError::Io(e) => e,
        }
    }
}

/// Path result type.
pub type PathResult<T> = Result<T, PathError>;

/// Errors reported by remote collaborators (object stores, data platforms).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not empty: {0}")]
    NotEmpty(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Transport, credential or any other failure without domain meaning.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    pub fn not_empty(what: impl Into<String>) -> Self {
        Self::NotEmpty(what.into())
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    /// Translate into the caller-facing taxonomy, naming `path` as the subject.
    pub fn at(self, path: impl Into<String>) -> PathError {
        match self {
            StoreError::NotFound(_) => PathError::NotFound(path.into()),
            StoreError::AlreadyExists(_) => PathError::AlreadyExists(path.into()),
            StoreError::NotEmpty(_) => PathError::NotEmpty(path.into()),
            StoreError::Unsupported(msg) => {
                PathError::UnsupportedOperation(format!("{}: {msg}", path.into()))
            }
            StoreError::Io(e) => PathError::Io(e),
        }
    }
}

/// Collaborator result type.
pub type StoreResult<T> = Result<T, StoreError>;
