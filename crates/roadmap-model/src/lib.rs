//! Roadmap model
//!
//! Pure types and checks shared by every other roadmap crate, with no I/O:
//!
//! - [`FeatureNumber`] / [`ActionNumber`]: validated identifiers with numeric ordering
//! - [`Status`] and [`TransitionPolicy`]: action lifecycle rules
//! - [`Roadmap`] / [`Feature`] / [`Action`]: the task tree
//! - [`RoadmapDocument`]: the tree plus free-text metadata, as persisted
//! - [`Issues`]: aggregated validation findings
//!
//! # Example
//!
//! ```rust
//! use roadmap_model::{Action, Feature, Roadmap};
//!
//! let roadmap = Roadmap::new().with_feature(
//!     Feature::new("1".parse().unwrap(), "Auth", "Login system")
//!         .with_action(Action::new("1.01".parse().unwrap(), "Build form")),
//! );
//! assert!(roadmap.validate().is_ok());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ids;
pub mod issues;
pub mod status;
pub mod tree;

pub use error::{IdKind, ModelError};
pub use ids::{validate_action_number, validate_feature_number, ActionNumber, FeatureNumber};
pub use issues::{Issue, Issues};
pub use status::{validate_status_transition, Status, TransitionPolicy};
pub use tree::{normalize_block, Action, Feature, Roadmap, RoadmapDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
