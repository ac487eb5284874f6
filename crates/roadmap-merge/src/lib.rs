//! Roadmap merge engine
//!
//! Pure tree transformations used inside the store's locked update:
//!
//! - [`merge`]: fold a batch of [`ProposedFeature`]s into a tree, append-only
//! - [`update_action`]: change one action's description and/or status
//!
//! Neither function performs I/O. Both either return a complete new state or
//! an error with the input left as it was.
//!
//! # Example
//!
//! ```rust
//! use roadmap_merge::{merge, ProposedFeature};
//!
//! let proposal =
//!     [ProposedFeature::new("1", "Auth", "Login system").with_action("1.01", "Build form")];
//! let first = merge(None, &proposal).unwrap();
//! let again = merge(Some(&first.roadmap), &proposal).unwrap();
//!
//! assert_eq!(first.roadmap, again.roadmap);
//! assert!(again.report.is_noop());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod merge;
pub mod proposal;
pub mod update;
pub mod validation;

pub use error::{FieldConflict, MergeError, UpdateError};
pub use merge::{merge, MergeReport, Merged};
pub use proposal::{ProposedAction, ProposedFeature};
pub use update::{update_action, ActionPatch, ActionUpdate};
pub use validation::validate_proposal;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
