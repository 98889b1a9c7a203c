//! Error taxonomy shared by the operation dispatcher and the archive engine.
//!
//! Every failure carries the operation that triggered it and the path it was
//! working on. [`OpError::kind`] collapses the detail into the coarse
//! [`ErrorKind`] tag that front ends render.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type OpResult<T> = Result<T, OpError>;

/// Coarse failure category reported in every failed operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    SameSource,
    PermissionDenied,
    InvalidPermissionFormat,
    IoFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::SameSource => "same source",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::InvalidPermissionFormat => "invalid permission format",
            ErrorKind::IoFailure => "io failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum OpError {
    #[error("'{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("'{}' already exists", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("source and destination are the same: '{}'", path.display())]
    SameSource { path: PathBuf },

    #[error("invalid permissions format '{value}', use octal such as 755")]
    InvalidPermissionFormat { value: String },

    #[error("{operation} failed for '{}': {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("walking '{}' failed: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Malformed or unsupported ZIP container, reported by the codec.
    #[error("archive '{}': {source:#}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl OpError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpError::NotFound { .. } => ErrorKind::NotFound,
            OpError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            OpError::SameSource { .. } => ErrorKind::SameSource,
            OpError::InvalidPermissionFormat { .. } => ErrorKind::InvalidPermissionFormat,
            OpError::Io { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                _ => ErrorKind::IoFailure,
            },
            OpError::Walk { source, .. } => match source.io_error().map(io::Error::kind) {
                Some(io::ErrorKind::PermissionDenied) => ErrorKind::PermissionDenied,
                _ => ErrorKind::IoFailure,
            },
            OpError::Archive { .. } => ErrorKind::IoFailure,
        }
    }
}
