//! Roadmap storage
//!
//! Persists [`RoadmapDocument`](roadmap_model::RoadmapDocument)s in a project
//! directory shared by independent processes:
//!
//! - [`lock`]: sentinel-file lock with stale reclaim and a bounded wait
//! - [`atomic`]: temp-file + fsync + rename writes, timestamped archives
//! - [`RoadmapStore`]: `exists` / `read` / `write` / `update` / `archive`
//!
//! Files in the directory (default name shown):
//!
//! | File | Purpose |
//! |------|---------|
//! | `ROADMAP.md` | live document |
//! | `ROADMAP.md.lock` | lock sentinel, holder pid inside |
//! | `ROADMAP.md.tmp.<millis>.<hex>` | in-flight write, never left behind on success |
//! | `ROADMAP.md.archive.<stamp>` | archived document, never overwritten |
//!
//! # Example
//!
//! ```rust,no_run
//! use roadmap_store::{Commit, RoadmapStore, StoreConfig, StoreError};
//!
//! let store = RoadmapStore::open(".", StoreConfig::default())?;
//! let _count = store.update(|current| {
//!     let document = current.ok_or_else(|| StoreError::NoDocument { path: "ROADMAP.md".into() })?;
//!     let count = document.roadmap.action_count();
//!     Ok::<_, StoreError>(Commit::new(document, count))
//! })?;
//! # Ok::<(), StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod atomic;
pub mod config;
pub mod error;
pub mod lock;
pub mod store;

pub use config::{StoreConfig, DEFAULT_FILE_NAME};
pub use error::{LockError, StoreError, WriteError};
pub use lock::{DirLock, LockConfig, LockGuard};
pub use store::{Commit, RoadmapStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
