//! Store configuration

use crate::lock::LockConfig;
use serde::{Deserialize, Serialize};

/// Default live document name
pub const DEFAULT_FILE_NAME: &str = "ROADMAP.md";

/// Where the document lives and how the lock behaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Live document file name inside the project directory
    pub file_name: String,
    /// Lock timing
    pub lock: LockConfig,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With document file name
    #[inline]
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// With lock timing
    #[inline]
    #[must_use]
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Sentinel name derived from the document name
    #[must_use]
    pub fn lock_file_name(&self) -> String {
        format!("{}.lock", self.file_name)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            lock: LockConfig::default(),
        }
    }
}
