//! Error types for backend and dispatcher operations.
//!
//! Most "not supported" outcomes never reach this type: the capability
//! contract reports them structurally (`false`, empty, `None`) and the
//! dispatcher picks a fallback. Errors are for failures that have no
//! fallback left.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Neither a file nor a directory exists at the path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A `can_*` predicate refused the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Session was not opened for writing.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Directory not empty.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Invalid path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A write or truncate would grow a buffered file past what can be held
    /// in memory.
    #[error("file too large: {0}")]
    FileTooLarge(String),

    /// Strict accounting refused growth past a configured maximum.
    ///
    /// The counters already include the deltas that triggered this.
    #[error("quota exceeded: {space}/{max_space:?} bytes, {nodes}/{max_nodes:?} nodes")]
    QuotaExceeded {
        /// Used bytes after the adjustment.
        space: i64,
        /// Configured byte limit.
        max_space: Option<u64>,
        /// Used nodes after the adjustment.
        nodes: i64,
        /// Configured node limit.
        max_nodes: Option<u64>,
    },

    /// The backend declined and no fallback exists.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Extended attribute not present.
    #[error("no such attribute: {0}")]
    NoAttribute(String),

    /// Configuration could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a DirectoryNotEmpty error.
    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a FileTooLarge error.
    pub fn file_too_large(path: impl Into<String>) -> Self {
        Self::FileTooLarge(path.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    /// Create a NoAttribute error.
    pub fn no_attribute(name: impl Into<String>) -> Self {
        Self::NoAttribute(name.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns true for a strict-mode quota failure.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Convert VfsError to std::io::Error for adapters that speak io errors.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::PermissionDenied(msg) => {
                io::Error::new(io::ErrorKind::PermissionDenied, msg)
            }
            VfsError::ReadOnly => {
                io::Error::new(io::ErrorKind::ReadOnlyFilesystem, "filesystem is read-only")
            }
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::DirectoryNotEmpty(msg) => {
                io::Error::new(io::ErrorKind::DirectoryNotEmpty, msg)
            }
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::FileTooLarge(msg) => io::Error::new(io::ErrorKind::FileTooLarge, msg),
            e @ VfsError::QuotaExceeded { .. } => {
                io::Error::new(io::ErrorKind::StorageFull, e.to_string())
            }
            VfsError::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            VfsError::NoAttribute(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::InvalidConfig(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            VfsError::Io(e) => e,
            VfsError::Other(msg) => io::Error::other(msg),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
