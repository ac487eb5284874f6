//! Testing utilities for the roadmap workspace
//!
//! Shared fixtures, proptest strategies and temp-dir helpers.

#![allow(missing_docs)]

use proptest::prelude::*;
use roadmap_model::{Action, ActionNumber, Feature, FeatureNumber, Roadmap, RoadmapDocument, Status};
use tempfile::TempDir;

pub fn fnum(s: &str) -> FeatureNumber {
    s.parse().unwrap()
}

pub fn anum(s: &str) -> ActionNumber {
    s.parse().unwrap()
}

pub fn action(number: &str, description: &str, status: Status) -> Action {
    Action::new(anum(number), description).with_status(status)
}

/// Feature 1 "Auth" with a single pending action 1.01
pub fn auth_feature() -> Feature {
    Feature::new(fnum("1"), "Auth", "Login system")
        .with_action(action("1.01", "Build form", Status::Pending))
}

pub fn sample_roadmap() -> Roadmap {
    Roadmap::new().with_feature(auth_feature())
}

pub fn sample_document() -> RoadmapDocument {
    RoadmapDocument::new("Auth", "Users log in with email and password.", sample_roadmap())
}

/// Two features, mixed statuses
pub fn multi_feature_document() -> RoadmapDocument {
    let roadmap = Roadmap::new()
        .with_feature(
            auth_feature()
                .with_action(action("1.02", "Validate input", Status::InProgress))
                .with_action(action("1.03", "Rate limiting", Status::Completed)),
        )
        .with_feature(
            Feature::new(fnum("2"), "Billing", "Invoices and payments")
                .with_action(action("2.01", "Invoice model", Status::Cancelled))
                .with_action(action("2.02", "Stripe hook", Status::Pending)),
        );
    RoadmapDocument::new(
        "Platform",
        "Phase one:\n  - auth\n  - billing\n\nShip by Q3.",
        roadmap,
    )
}

/// Same document with every action completed or cancelled
pub fn finished_document() -> RoadmapDocument {
    let mut doc = multi_feature_document();
    for feature in &mut doc.roadmap.features {
        for action in &mut feature.actions {
            if action.status.is_incomplete() {
                action.status = Status::Completed;
            }
        }
    }
    doc
}

pub fn temp_project_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn any_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Pending),
        Just(Status::InProgress),
        Just(Status::Completed),
        Just(Status::Cancelled),
    ]
}

/// One line of free text with characters that stress YAML quoting,
/// including non-ASCII text and terminal control bytes
pub fn any_line() -> impl Strategy<Value = String> {
    concat!(
        "[A-Za-z0-9\u{e9}\u{6f22}]",
        "[A-Za-z0-9 .,:#'\"`\\-\\[\\]{}|>&*!%@",
        "\u{e9}\u{df}\u{6f22}\u{1f680}\u{1b}\u{7}\u{7f}\u{9b}]{0,30}",
    )
}

/// Free text of one to three lines, never blank
pub fn any_text() -> impl Strategy<Value = String> {
    prop::collection::vec(any_line(), 1..=3).prop_map(|lines| lines.join("\n"))
}

/// Valid roadmap: features numbered 1..=n, actions numbered .01 upward
pub fn any_roadmap() -> impl Strategy<Value = Roadmap> {
    let feature = (
        any_line(),
        any_text(),
        prop::collection::vec((any_text(), any_status()), 1..=4),
    );
    prop::collection::vec(feature, 1..=4).prop_map(|features| {
        let features = features
            .into_iter()
            .zip(1u32..)
            .map(|((title, description, actions), n)| {
                let number = fnum(&n.to_string());
                let actions = actions
                    .into_iter()
                    .zip(1u32..)
                    .map(|((text, status), seq)| {
                        Action::new(ActionNumber::compose(&number, seq).unwrap(), text)
                            .with_status(status)
                    })
                    .collect();
                Feature {
                    number,
                    title,
                    description,
                    actions,
                }
            })
            .collect();
        Roadmap { features }
    })
}

/// Valid document with normalized metadata
pub fn any_document() -> impl Strategy<Value = RoadmapDocument> {
    (any_line(), prop::collection::vec(any_line(), 0..=4), any_roadmap()).prop_map(
        |(feature, spec_lines, roadmap)| {
            RoadmapDocument::new(feature, spec_lines.join("\n  "), roadmap)
        },
    )
}
