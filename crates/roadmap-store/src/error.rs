//! Storage error types

use roadmap_codec::CodecError;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Lock acquisition failure
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another holder kept the lock for the whole wait budget
    #[error("lock {path:?} still held after {waited:?}")]
    Timeout {
        /// Sentinel path
        path: PathBuf,
        /// Time spent waiting
        waited: Duration,
    },

    /// Filesystem failure while handling the sentinel
    #[error("lock {path:?}: {source}")]
    Io {
        /// Sentinel path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Whether retrying after a backoff may succeed
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Atomic write or archive failure
#[derive(Debug, thiserror::Error)]
#[error("{path:?}: {source}")]
pub struct WriteError {
    /// File or directory the operation failed on
    pub path: PathBuf,
    /// Underlying error
    #[source]
    pub source: io::Error,
}

impl WriteError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Any storage failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Stored text is corrupt, or a document could not be encoded
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Lock could not be acquired
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// Atomic write or archive failed
    #[error("write failed: {0}")]
    Write(#[from] WriteError),

    /// Other filesystem failure
    #[error("io error on {path:?}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Operation needs a live document and there is none
    #[error("no roadmap document at {path:?}")]
    NoDocument {
        /// Expected document path
        path: PathBuf,
    },

    /// Configured file name is empty or contains a path separator
    #[error("invalid document file name '{name}'")]
    InvalidFileName {
        /// Offending name
        name: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Only lock contention is worth retrying
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Lock(e) if e.is_timeout())
    }

    /// Stored data is unreadable and needs manual repair
    #[inline]
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_corruption())
    }
}
