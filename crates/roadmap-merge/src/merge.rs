//! Append-only merge of a proposal into a stored tree
//!
//! Stored features keep their identity, title and description. Stored
//! actions are never touched: re-submitting one is skipped, which makes a
//! merge idempotent. New actions always start `pending`.

use crate::error::{FieldConflict, MergeError};
use crate::proposal::ProposedFeature;
use crate::validation::validate_proposal;
use roadmap_model::{ActionNumber, Feature, FeatureNumber, Issues, Roadmap};
use serde::Serialize;

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Features that did not exist before
    pub added_features: Vec<FeatureNumber>,
    /// Actions appended (including those of new features)
    pub added_actions: Vec<ActionNumber>,
    /// Proposed actions that already existed
    pub skipped_actions: Vec<ActionNumber>,
}

impl MergeReport {
    /// Whether the merge left the tree unchanged
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added_features.is_empty() && self.added_actions.is_empty()
    }
}

/// Merged tree plus the change report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    /// Resulting tree, sorted and validated
    pub roadmap: Roadmap,
    /// What changed
    pub report: MergeReport,
}

/// Fold `proposed` into `existing` (or into an empty tree)
///
/// # Errors
/// - `MergeError::Validation` when the proposal itself is malformed
/// - `MergeError::ImmutableFieldViolation` listing every changed title/description
/// - `MergeError::Invariant` if the merged tree fails validation
pub fn merge(
    existing: Option<&Roadmap>,
    proposed: &[ProposedFeature],
) -> Result<Merged, MergeError> {
    let incoming = validate_proposal(proposed).map_err(MergeError::Validation)?;

    let mut roadmap = existing.cloned().unwrap_or_default();
    let mut report = MergeReport::default();
    let mut conflicts = Vec::new();

    for feature in incoming {
        match roadmap.feature_mut(&feature.number) {
            Some(current) => {
                if collect_conflicts(current, &feature, &mut conflicts) {
                    continue;
                }
                for action in feature.actions {
                    if current.action(&action.number).is_some() {
                        report.skipped_actions.push(action.number);
                    } else {
                        report.added_actions.push(action.number.clone());
                        current.actions.push(action);
                    }
                }
                current.sort_actions();
            }
            None => {
                report.added_features.push(feature.number.clone());
                report
                    .added_actions
                    .extend(feature.actions.iter().map(|a| a.number.clone()));
                roadmap.features.push(feature);
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(MergeError::ImmutableFieldViolation { conflicts });
    }

    roadmap.sort_features();
    check_invariants(&roadmap).map_err(MergeError::Invariant)?;

    tracing::debug!(
        added_features = report.added_features.len(),
        added_actions = report.added_actions.len(),
        skipped_actions = report.skipped_actions.len(),
        "merged proposal"
    );
    Ok(Merged { roadmap, report })
}

/// Record title/description mismatches; true if any were found
fn collect_conflicts(current: &Feature, proposed: &Feature, out: &mut Vec<FieldConflict>) -> bool {
    let before = out.len();
    let fields = [
        ("title", &current.title, &proposed.title),
        ("description", &current.description, &proposed.description),
    ];
    for (field, existing, new) in fields {
        if existing != new {
            out.push(FieldConflict {
                feature: current.number.clone(),
                field,
                existing: existing.clone(),
                proposed: new.clone(),
            });
        }
    }
    out.len() > before
}

/// Full-tree checks before commit: identifiers, uniqueness, prefixes, order
/// and the at-least-one-action rule, which append-only merging cannot break.
fn check_invariants(roadmap: &Roadmap) -> Result<(), Issues> {
    roadmap.validate()
}
