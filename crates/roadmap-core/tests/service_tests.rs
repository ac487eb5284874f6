use pretty_assertions::assert_eq;
use roadmap_core::prelude::*;
use roadmap_core::{MergeError, ModelError, UpdateError, CONFIG_FILE_NAME};
use roadmap_test_utils::{anum, fnum, sample_document, temp_project_dir};
use std::fs;

fn auth_proposal() -> Proposal {
    Proposal::new(vec![
        ProposedFeature::new("1", "Auth", "Login system").with_action("1.01", "Build form")
    ])
    .with_feature("Auth")
    .with_spec("Users log in with email and password.")
}

fn created(dir: &std::path::Path) -> RoadmapService {
    let service = RoadmapService::open(dir, RoadmapConfig::default()).unwrap();
    let outcome = service.create_or_merge(auth_proposal()).unwrap();
    assert!(outcome.created);
    service
}

#[test]
fn test_create_returns_exact_tree() {
    let dir = temp_project_dir();
    let service = created(dir.path());

    assert!(service.exists());
    assert_eq!(service.get().unwrap(), Some(sample_document()));
}

#[test]
fn test_merge_appends_action_in_order() {
    let dir = temp_project_dir();
    let service = created(dir.path());

    let outcome = service
        .create_or_merge(Proposal::new(vec![
            ProposedFeature::new("1", "Auth", "Login system").with_action("1.02", "Validate input")
        ]))
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.report.added_actions, vec![anum("1.02")]);
    let doc = service.get().unwrap().unwrap();
    let numbers: Vec<_> = doc.roadmap.features[0]
        .actions
        .iter()
        .map(|a| a.number.as_str().to_string())
        .collect();
    assert_eq!(numbers, vec!["1.01", "1.02"]);
    assert_eq!(doc.feature, "Auth");
}

#[test]
fn test_title_change_is_rejected_and_nothing_written() {
    let dir = temp_project_dir();
    let service = created(dir.path());
    let before = fs::read(service.store().document_path()).unwrap();

    let err = service
        .create_or_merge(Proposal::new(vec![
            ProposedFeature::new("1", "Authentication", "Login system")
                .with_action("1.02", "Validate")
        ]))
        .unwrap_err();

    match err {
        RoadmapError::Merge(MergeError::ImmutableFieldViolation { conflicts }) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].field, "title");
            assert_eq!(conflicts[0].feature, fnum("1"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read(service.store().document_path()).unwrap(), before);
}

#[test]
fn test_completing_last_action_archives() {
    let dir = temp_project_dir();
    let service = created(dir.path());

    let outcome = service
        .update_action("1.01", &ActionPatch::new().with_status("completed"))
        .unwrap();

    assert!(outcome.archived);
    assert_eq!(outcome.previous_status, Status::Pending);
    assert_eq!(outcome.action.status, Status::Completed);
    assert!(!service.exists());
    assert_eq!(service.get().unwrap(), None);

    let archives = service.archives().unwrap();
    assert_eq!(archives.len(), 1);
    let archived = roadmap_core::decode(&fs::read_to_string(&archives[0]).unwrap()).unwrap();
    assert_eq!(archived.roadmap.features[0].actions[0].status, Status::Completed);
}

#[test]
fn test_cancelled_action_is_terminal() {
    let dir = temp_project_dir();
    let service = created(dir.path());
    service
        .create_or_merge(Proposal::new(vec![
            ProposedFeature::new("1", "Auth", "Login system").with_action("1.02", "Validate")
        ]))
        .unwrap();
    service
        .update_action("1.01", &ActionPatch::new().with_status("cancelled"))
        .unwrap();

    for requested in ["pending", "in_progress", "completed", "cancelled"] {
        let err = service
            .update_action("1.01", &ActionPatch::new().with_status(requested))
            .unwrap_err();
        let terminal = ModelError::TerminalState(Status::Cancelled);
        assert!(
            matches!(&err, RoadmapError::Update(e) if e.model_error() == Some(&terminal)),
            "{requested}: {err}"
        );
        assert!(err.is_user_error());
    }
    assert!(service.exists());
}

#[test]
fn test_unknown_action_is_not_found() {
    let dir = temp_project_dir();
    let service = created(dir.path());

    let err = service
        .update_action("1.09", &ActionPatch::new().with_status("completed"))
        .unwrap_err();
    assert!(matches!(err, RoadmapError::Update(UpdateError::NotFound { .. })));
    assert!(err.is_not_found());
}

#[test]
fn test_metadata_is_replaced_when_given() {
    let dir = temp_project_dir();
    let service = created(dir.path());

    let outcome = service
        .create_or_merge(Proposal {
            feature: None,
            ..auth_proposal().with_spec("Rewritten spec")
        })
        .unwrap();

    assert!(outcome.report.is_noop());
    assert_eq!(outcome.document.spec, "Rewritten spec");
    assert_eq!(outcome.document.feature, "Auth");
    assert_eq!(service.get().unwrap().unwrap().spec, "Rewritten spec");
}

#[test]
fn test_strict_policy_from_config_file() {
    let dir = temp_project_dir();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "transition_policy = \"strict\"\n[store]\nfile_name = \"plan.md\"\n",
    )
    .unwrap();

    let service = RoadmapService::discover(dir.path()).unwrap();
    assert_eq!(service.policy(), TransitionPolicy::Strict);
    service.create_or_merge(auth_proposal()).unwrap();
    assert!(dir.path().join("plan.md").is_file());

    let err = service
        .update_action("1.01", &ActionPatch::new().with_status("completed"))
        .unwrap_err();
    assert!(err.is_user_error());

    service
        .update_action("1.01", &ActionPatch::new().with_status("in_progress"))
        .unwrap();
    let done = service
        .update_action("1.01", &ActionPatch::new().with_status("completed"))
        .unwrap();
    assert!(done.archived);
}

#[test]
fn test_manual_archive_then_recreate() {
    let dir = temp_project_dir();
    let service = created(dir.path());

    let archived = service.archive().unwrap();
    assert!(archived.is_file());
    assert!(!service.exists());

    let again = service.create_or_merge(auth_proposal()).unwrap();
    assert!(again.created);
    assert_eq!(service.archives().unwrap(), vec![archived]);
}

#[test]
fn test_terminal_output_in_spec_keeps_roadmap_usable() {
    let dir = temp_project_dir();
    let service = RoadmapService::open(dir.path(), RoadmapConfig::default()).unwrap();
    let spec = "Pasted log:\n\u{1b}[31merror\u{1b}[0m \u{7}\r\nnext\u{2028}line";

    service.create_or_merge(auth_proposal().with_spec(spec)).unwrap();

    let doc = service.get().unwrap().unwrap();
    assert_eq!(doc.spec, "Pasted log:\n\u{1b}[31merror\u{1b}[0m \u{7}\nnext\nline");
    service
        .update_action("1.01", &ActionPatch::new().with_status("in_progress"))
        .unwrap();
    assert_eq!(service.get().unwrap().unwrap().spec, doc.spec);
}
