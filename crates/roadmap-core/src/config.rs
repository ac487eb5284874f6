//! Service configuration, loaded from TOML
//!
//! ```toml
//! transition_policy = "strict"
//!
//! [store]
//! file_name = "ROADMAP.md"
//!
//! [store.lock]
//! stale_after_ms = 30000
//! retry_interval_ms = 50
//! timeout_ms = 5000
//! ```
//!
//! Every key is optional.

use roadmap_model::TransitionPolicy;
use roadmap_store::{LockConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name looked up by [`RoadmapConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "roadmap.toml";

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path:?}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// File is not valid configuration TOML
    #[error("invalid config {path:?}: {source}")]
    Parse {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Roadmap service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapConfig {
    /// Storage settings
    pub store: StoreConfig,
    /// Status change rules for action updates
    pub transition_policy: TransitionPolicy,
}

impl RoadmapConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With storage settings
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// With lock timing
    #[inline]
    #[must_use]
    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.store.lock = lock;
        self
    }

    /// With transition policy
    #[inline]
    #[must_use]
    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `toml::de::Error` for malformed input or unknown values
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` / `ConfigError::Parse`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `<dir>/roadmap.toml` if present, defaults otherwise
    ///
    /// # Errors
    /// Same as [`RoadmapConfig::load`] when the file exists
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
