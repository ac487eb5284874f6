//! Error types for the roadmap service
//!
//! [`RoadmapError`] wraps every lower-layer error so callers match on one
//! type:
//! - corruption of the stored file (`Store` with a codec error)
//! - bad input (`Merge`, `Update`, `MissingMetadata`)
//! - contention (`Store` with a lock timeout, retryable)

use crate::config::ConfigError;
use roadmap_merge::{MergeError, UpdateError};
use roadmap_store::StoreError;
use std::path::PathBuf;

/// Main roadmap error type
#[derive(Debug, thiserror::Error)]
pub enum RoadmapError {
    /// Storage failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Proposal rejected
    #[error("merge rejected: {0}")]
    Merge(#[from] MergeError),

    /// Action update rejected
    #[error("update rejected: {0}")]
    Update(#[from] UpdateError),

    /// Operation needs an existing roadmap
    #[error("no roadmap at {path:?}")]
    NoRoadmap {
        /// Expected document path
        path: PathBuf,
    },

    /// First proposal in a directory must carry this metadata field
    #[error("creating a roadmap requires the '{0}' field")]
    MissingMetadata(&'static str),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RoadmapError {
    /// Retry the whole operation after a backoff
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }

    /// Caller should re-query current state before retrying
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoRoadmap { .. } | Self::Update(UpdateError::NotFound { .. })
        )
    }

    /// Stored file needs manual repair
    #[inline]
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_corruption())
    }

    /// Caller must fix the request; retrying it unchanged cannot succeed
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Merge(e) => e.is_user_error(),
            Self::Update(e) => !matches!(e, UpdateError::NotFound { .. }),
            Self::MissingMetadata(_) => true,
            _ => false,
        }
    }
}
