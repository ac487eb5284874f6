//! Merge and update errors

use roadmap_model::{ActionNumber, FeatureNumber, Issues, ModelError};
use std::fmt::{self, Display, Formatter};

/// Existing feature field that a proposal tried to change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    /// Feature number
    pub feature: FeatureNumber,
    /// `title` or `description`
    pub field: &'static str,
    /// Stored value
    pub existing: String,
    /// Proposed value
    pub proposed: String,
}

impl Display for FieldConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "feature {} {}: stored {:?}, proposed {:?}",
            self.feature, self.field, self.existing, self.proposed
        )
    }
}

fn list_conflicts(conflicts: &[FieldConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Merge failure; no partial result is ever produced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Proposed input is malformed or inconsistent
    #[error("validation failed: {0}")]
    Validation(Issues),

    /// Proposal changes the title or description of a stored feature
    #[error("immutable field violation: {}", list_conflicts(.conflicts))]
    ImmutableFieldViolation {
        /// Every conflicting field
        conflicts: Vec<FieldConflict>,
    },

    /// Merged tree breaks an invariant; indicates a bug, not bad input
    #[error("post-merge invariant violation: {0}")]
    Invariant(Issues),
}

impl MergeError {
    /// Whether the caller can fix the input and retry
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Invariant(_))
    }
}

/// Single-action update failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// Action number is malformed
    #[error("invalid action number: {0}")]
    InvalidFormat(#[source] ModelError),

    /// No such action in the tree
    #[error("action {number} not found")]
    NotFound {
        /// Requested action
        number: ActionNumber,
    },

    /// Status rules rejected the change
    #[error("action {number}: {source}")]
    Model {
        /// Target action
        number: ActionNumber,
        /// Underlying rule violation
        #[source]
        source: ModelError,
    },

    /// Neither description nor status given
    #[error("action {number}: update must change description or status")]
    EmptyPatch {
        /// Target action
        number: ActionNumber,
    },

    /// Replacement description is blank
    #[error("action {number}: description must not be empty")]
    EmptyDescription {
        /// Target action
        number: ActionNumber,
    },
}

impl UpdateError {
    /// Underlying model error, if any
    #[must_use]
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            Self::InvalidFormat(e) | Self::Model { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display_shows_both_values() {
        let err = MergeError::ImmutableFieldViolation {
            conflicts: vec![FieldConflict {
                feature: "1".parse().unwrap(),
                field: "title",
                existing: "Auth".to_string(),
                proposed: "Login".to_string(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "immutable field violation: feature 1 title: stored \"Auth\", proposed \"Login\""
        );
        assert!(err.is_user_error());
    }
}
