use pretty_assertions::assert_eq;
use roadmap_model::{Action, RoadmapDocument, Status};
use roadmap_store::{Commit, LockConfig, RoadmapStore, StoreConfig, StoreError};
use roadmap_test_utils::{anum, sample_document, temp_project_dir};
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn open(dir: &std::path::Path) -> RoadmapStore {
    RoadmapStore::open(dir, StoreConfig::new()).unwrap()
}

#[derive(Debug, thiserror::Error)]
enum TestError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("rejected")]
    Rejected,
}

#[test]
fn test_create_then_read_returns_same_tree() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    assert!(!store.exists());

    let created = store
        .update(|current| {
            assert!(current.is_none());
            Ok::<_, StoreError>(Commit::new(sample_document(), "created"))
        })
        .unwrap();

    assert_eq!(created, "created");
    assert!(store.exists());
    let doc = store.read().unwrap().unwrap();
    assert_eq!(doc, sample_document());
    let action = &doc.roadmap.features[0].actions[0];
    assert_eq!(action.number.as_str(), "1.01");
    assert_eq!(action.status, Status::Pending);
}

#[test]
fn test_failed_transform_writes_nothing() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    store.write(&sample_document()).unwrap();
    let before = fs::read(store.document_path()).unwrap();

    let err = store
        .update(|_| Err::<Commit<()>, _>(TestError::Rejected))
        .unwrap_err();
    assert!(matches!(err, TestError::Rejected));

    assert_eq!(fs::read(store.document_path()).unwrap(), before);
    assert!(!store.lock_path().exists());
}

#[test]
fn test_invalid_commit_is_not_written() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    store.write(&sample_document()).unwrap();

    let err = store
        .update(|current| {
            let mut doc = current.unwrap();
            doc.roadmap.features[0].actions.clear();
            Ok::<_, StoreError>(Commit::new(doc, ()))
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Codec(roadmap_codec::CodecError::Schema(_))));
    assert_eq!(store.read().unwrap(), Some(sample_document()));
}

#[test]
fn test_last_completion_archives_under_lock() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    store.write(&sample_document()).unwrap();

    let archive_requested = store
        .update(|current| {
            let mut doc: RoadmapDocument = current.unwrap();
            doc.roadmap.action_mut(&anum("1.01")).unwrap().status = Status::Completed;
            let done = !doc.roadmap.has_incomplete_actions();
            Ok::<_, StoreError>(Commit::new(doc, done).with_archive(done))
        })
        .unwrap();

    assert!(archive_requested);
    assert!(!store.exists());
    assert_eq!(store.read().unwrap(), None);

    let archives = store.archives().unwrap();
    assert_eq!(archives.len(), 1);
    let archived = roadmap_codec::decode(&fs::read_to_string(&archives[0]).unwrap()).unwrap();
    assert_eq!(archived.roadmap.features[0].actions[0].status, Status::Completed);
    assert!(!store.lock_path().exists());
}

#[test]
fn test_concurrent_updates_are_serialized() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    store.write(&sample_document()).unwrap();

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let path = dir.path().to_path_buf();
            thread::spawn(move || {
                let store = RoadmapStore::open(&path, StoreConfig::new()).unwrap();
                barrier.wait();
                store
                    .update(|current| {
                        let mut doc = current.unwrap();
                        let seen = doc.roadmap.action_count();
                        let number = format!("1.{:02}", seen + 1);
                        doc.roadmap.features[0]
                            .actions
                            .push(Action::new(anum(&number), format!("worker {i}")));
                        Ok::<_, StoreError>(Commit::new(doc, seen))
                    })
                    .unwrap()
            })
        })
        .collect();

    let mut seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    seen.sort_unstable();

    // Each worker saw every earlier commit, so counts are 1..=workers exactly.
    assert_eq!(seen, (1..=workers).collect::<Vec<_>>());
    assert_eq!(store.read().unwrap().unwrap().roadmap.action_count(), workers + 1);
}

#[test]
fn test_stale_lock_does_not_block_writer() {
    let dir = temp_project_dir();
    let config = StoreConfig::new().with_lock(
        LockConfig::new()
            .with_stale_after(Duration::from_millis(50))
            .with_timeout(Duration::from_secs(2)),
    );
    let store = RoadmapStore::open(dir.path(), config).unwrap();

    fs::write(store.lock_path(), "424242\n").unwrap();
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    store.write(&sample_document()).unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!store.lock_path().exists());
}

#[test]
fn test_held_lock_times_out_as_retryable() {
    let dir = temp_project_dir();
    let config =
        StoreConfig::new().with_lock(LockConfig::new().with_timeout(Duration::from_millis(120)));
    let store = RoadmapStore::open(dir.path(), config).unwrap();

    fs::write(store.lock_path(), "1\n").unwrap();
    let err = store.write(&sample_document()).unwrap_err();
    assert!(err.is_retryable());
    assert!(!store.exists());
}

#[test]
fn test_leftover_temp_file_is_ignored_and_cleaned() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    store.write(&sample_document()).unwrap();

    // Writer died between creating its temp file and renaming it.
    let debris = dir.path().join("ROADMAP.md.tmp.1700000000000.0badc0de");
    fs::write(&debris, "---\nfeature: half writ").unwrap();

    assert_eq!(store.read().unwrap(), Some(sample_document()));
    assert_eq!(store.clean_stale_temps(Duration::ZERO).unwrap(), 1);
    assert!(!debris.exists());
    assert!(store.exists());
}

#[test]
fn test_corrupt_document_is_reported_not_coerced() {
    let dir = temp_project_dir();
    let store = open(dir.path());
    fs::write(store.document_path(), "# Roadmap\n\n- [ ] something\n").unwrap();

    let err = store.read().unwrap_err();
    assert!(err.is_corruption());
    assert!(!err.is_retryable());
}

#[test]
fn test_custom_file_name() {
    let dir = temp_project_dir();
    let store =
        RoadmapStore::open(dir.path(), StoreConfig::new().with_file_name("plan.md")).unwrap();
    store.write(&sample_document()).unwrap();

    assert!(dir.path().join("plan.md").is_file());
    assert_eq!(store.lock_path(), dir.path().join("plan.md.lock"));
    let archived = store.archive().unwrap();
    assert!(archived
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("plan.md.archive.")));
}
