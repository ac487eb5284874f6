use pretty_assertions::assert_eq;
use proptest::prelude::*;
use roadmap_merge::{merge, update_action, ActionPatch, MergeError, ProposedFeature, UpdateError};
use roadmap_model::{ModelError, Status, TransitionPolicy};
use roadmap_test_utils::{any_status, sample_roadmap};

/// Proposal with unique numbers in arbitrary order
fn any_proposal() -> impl Strategy<Value = Vec<ProposedFeature>> {
    prop::collection::btree_map(1u32..30, prop::collection::btree_set(1u32..100, 1..6), 1..5)
        .prop_map(|features| {
            features
                .into_iter()
                .map(|(n, actions)| {
                    let mut feature = ProposedFeature::new(
                        n.to_string(),
                        format!("Feature {n}"),
                        format!("About {n}"),
                    );
                    for seq in actions.into_iter().rev() {
                        feature =
                            feature.with_action(format!("{n}.{seq:02}"), format!("Step {seq}"));
                    }
                    feature
                })
                .rev()
                .collect()
        })
}

proptest! {
    #[test]
    fn prop_merge_is_idempotent(proposal in any_proposal()) {
        let once = merge(None, &proposal).unwrap();
        let twice = merge(Some(&once.roadmap), &proposal).unwrap();

        prop_assert_eq!(&once.roadmap, &twice.roadmap);
        prop_assert!(twice.report.is_noop());
        prop_assert_eq!(twice.report.skipped_actions.len(), once.roadmap.action_count());
    }

    #[test]
    fn prop_merge_output_is_sorted(base in any_proposal(), extra in any_proposal()) {
        let base = merge(None, &base).unwrap().roadmap;
        // Titles follow the number, so overlapping features never conflict.
        let merged = merge(Some(&base), &extra).unwrap().roadmap;

        prop_assert!(merged.features.windows(2).all(|w| w[0].number < w[1].number));
        for feature in &merged.features {
            prop_assert!(feature.actions.windows(2).all(|w| w[0].number < w[1].number));
        }
        prop_assert!(merged.validate().is_ok());
    }

    #[test]
    fn prop_cancelled_is_terminal(requested in any_status()) {
        let mut roadmap = sample_roadmap();
        roadmap.features[0].actions[0].status = Status::Cancelled;
        let patch = ActionPatch::new().with_status(requested.as_str());

        let err =
            update_action(&mut roadmap, "1.01", &patch, TransitionPolicy::Permissive).unwrap_err();
        prop_assert_eq!(err.model_error(), Some(&ModelError::TerminalState(Status::Cancelled)));
    }
}

#[test]
fn test_adding_action_keeps_numeric_order() {
    let proposal =
        [ProposedFeature::new("1", "Auth", "Login system").with_action("1.02", "Validate input")];
    let merged = merge(Some(&sample_roadmap()), &proposal).unwrap();

    let numbers: Vec<&str> = merged.roadmap.features[0]
        .actions
        .iter()
        .map(|a| a.number.as_str())
        .collect();
    assert_eq!(numbers, ["1.01", "1.02"]);
    assert_eq!(merged.report.added_actions.len(), 1);
}

#[test]
fn test_changed_title_is_an_immutable_field_violation() {
    let base = sample_roadmap();
    let proposal =
        [ProposedFeature::new("1", "Authentication", "Login system").with_action("1.02", "x")];

    let err = merge(Some(&base), &proposal).unwrap_err();
    match err {
        MergeError::ImmutableFieldViolation { conflicts } => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].existing, "Auth");
            assert_eq!(conflicts[0].proposed, "Authentication");
        }
        other => panic!("expected immutable field violation, got {other:?}"),
    }
    assert_eq!(base, sample_roadmap());
}

#[test]
fn test_update_on_cancelled_action_is_terminal() {
    let mut roadmap = sample_roadmap();
    roadmap.features[0].actions[0].status = Status::Cancelled;

    let err = update_action(
        &mut roadmap,
        "1.01",
        &ActionPatch::new().with_status("in_progress"),
        TransitionPolicy::Strict,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Model { source: ModelError::TerminalState(Status::Cancelled), .. }
    ));
}

#[test]
fn test_validation_errors_are_aggregated() {
    let proposal = [
        ProposedFeature::new("1", "", "").with_action("2.01", "wrong prefix"),
        ProposedFeature::new("1", "Dup", "dup").with_action("1.5", "bad number"),
    ];
    match merge(None, &proposal) {
        Err(MergeError::Validation(issues)) => {
            assert!(issues.mentions("title must not be empty"));
            assert!(issues.mentions("description must not be empty"));
            assert!(issues.mentions("prefix does not match"));
            assert!(issues.mentions("duplicate feature number"));
            assert!(issues.iter().any(|i| i.subject == "action 1.5"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}
