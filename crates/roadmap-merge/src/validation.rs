//! Proposal validation
//!
//! Two passes over the proposed batch only, both run to completion:
//! - structure: every feature has actions, no blank titles or descriptions
//! - consistency: identifiers well-formed, unique across the batch, and
//!   every action prefix matches its feature
//!
//! The passes never consult the stored tree. Conflicts with stored data are
//! the merge pass's concern.

use crate::proposal::ProposedFeature;
use roadmap_model::{Action, ActionNumber, Feature, FeatureNumber, Issues};
use std::collections::HashSet;

/// Validate a proposal and convert it into typed features
///
/// Returned features hold `pending` actions in numeric order; feature order
/// follows the input.
///
/// # Errors
/// Every finding from both passes
pub fn validate_proposal(proposed: &[ProposedFeature]) -> Result<Vec<Feature>, Issues> {
    let mut issues = Issues::new();

    if proposed.is_empty() {
        issues.push("proposal", "must contain at least one feature");
    }

    check_structure(proposed, &mut issues);
    let features = check_consistency(proposed, &mut issues);

    issues.into_result().map(|()| features)
}

fn check_structure(proposed: &[ProposedFeature], issues: &mut Issues) {
    for feature in proposed {
        let subject = format!("feature {}", feature.number);

        if feature.title.trim().is_empty() {
            issues.push(&subject, "title must not be empty");
        }
        if feature.description.trim().is_empty() {
            issues.push(&subject, "description must not be empty");
        }
        if feature.actions.is_empty() {
            issues.push(&subject, "must contain at least one action");
        }

        for action in &feature.actions {
            if action.description.trim().is_empty() {
                issues.push(
                    format!("action {}", action.number),
                    "description must not be empty",
                );
            }
        }
    }
}

fn check_consistency(proposed: &[ProposedFeature], issues: &mut Issues) -> Vec<Feature> {
    let mut seen_features: HashSet<String> = HashSet::new();
    let mut seen_actions: HashSet<(String, String)> = HashSet::new();
    let mut typed = Vec::with_capacity(proposed.len());

    for raw in proposed {
        let subject = format!("feature {}", raw.number);

        let number = match FeatureNumber::parse(&raw.number) {
            Ok(number) => {
                if !seen_features.insert(number.numeric_key().to_string()) {
                    issues.push(&subject, "duplicate feature number in proposal");
                }
                Some(number)
            }
            Err(e) => {
                issues.push(&subject, e.to_string());
                None
            }
        };

        let mut actions = Vec::with_capacity(raw.actions.len());
        for action in &raw.actions {
            let subject = format!("action {}", action.number);

            let action_number = match ActionNumber::parse(&action.number) {
                Ok(n) => n,
                Err(e) => {
                    issues.push(&subject, e.to_string());
                    continue;
                }
            };

            let (major, minor) = action_number.numeric_key();
            if !seen_actions.insert((major.to_string(), minor.to_string())) {
                issues.push(&subject, "duplicate action number in proposal");
            }
            if let Some(feature) = &number {
                if !action_number.belongs_to(feature) {
                    issues.push(
                        &subject,
                        format!("prefix does not match enclosing feature {feature}"),
                    );
                }
            }

            actions.push(Action::new(action_number, action.description.clone()));
        }

        if let Some(number) = number {
            let mut feature = Feature {
                number,
                title: raw.title.clone(),
                description: raw.description.clone(),
                actions,
            };
            feature.sort_actions();
            typed.push(feature);
        }
    }

    typed
}
