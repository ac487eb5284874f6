//! Roadmap service
//!
//! Keeps one `ROADMAP.md` per project directory: a feature/action plan that
//! several independent processes may create, extend and tick off at the same
//! time.
//!
//! ```rust,no_run
//! use roadmap_core::prelude::*;
//!
//! let service = RoadmapService::discover(".")?;
//! service.create_or_merge(
//!     Proposal::new(vec![
//!         ProposedFeature::new("1", "Auth", "Login").with_action("1.01", "Build form")
//!     ])
//!     .with_feature("Auth")
//!     .with_spec("Users log in with email and password."),
//! )?;
//! service.update_action("1.01", &ActionPatch::new().with_status("in_progress"))?;
//! # Ok::<(), RoadmapError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod service;

pub use config::{ConfigError, RoadmapConfig, CONFIG_FILE_NAME};
pub use error::RoadmapError;
pub use service::{ActionOutcome, MergeOutcome, Proposal, RoadmapService};

pub use roadmap_codec::{decode, encode, CodecError, DocumentCodec, FormatError, MarkdownCodec};
pub use roadmap_merge::{
    ActionPatch, MergeError, MergeReport, ProposedAction, ProposedFeature, UpdateError,
};
pub use roadmap_model::{
    Action, ActionNumber, Feature, FeatureNumber, ModelError, Roadmap, RoadmapDocument, Status,
    TransitionPolicy,
};
pub use roadmap_store::{LockConfig, LockError, RoadmapStore, StoreConfig, StoreError};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::RoadmapConfig;
    pub use crate::error::RoadmapError;
    pub use crate::service::{ActionOutcome, MergeOutcome, Proposal, RoadmapService};
    pub use roadmap_merge::{ActionPatch, ProposedFeature};
    pub use roadmap_model::{Action, Feature, Roadmap, RoadmapDocument, Status, TransitionPolicy};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
