//! Crash-safe file replacement and archival
//!
//! Writes go to a uniquely named sibling temp file, are synced, then renamed
//! over the target, and finally the directory itself is synced so the rename
//! survives a crash. A reader sees the old content or the new content, never
//! a mix.

use crate::error::WriteError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Infix of temp file names: `<final>.tmp.<millis>.<hex>`
pub const TEMP_MARKER: &str = ".tmp.";

/// Infix of archive names: `<live>.archive.<stamp>`
pub const ARCHIVE_MARKER: &str = ".archive.";

/// Atomically replace `dir/final_name` with `bytes`
///
/// # Errors
/// `WriteError` naming the file or directory that failed. The temp file is
/// removed on failure; a failure to remove it is only logged.
pub fn write_atomic(dir: &Path, final_name: &str, bytes: &[u8]) -> Result<PathBuf, WriteError> {
    let final_path = dir.join(final_name);
    let temp_path = dir.join(temp_name(final_name));

    let written = write_synced(&temp_path, bytes).and_then(|()| {
        fs::rename(&temp_path, &final_path).map_err(|e| WriteError::new(&final_path, e))
    });
    if let Err(err) = written {
        discard(&temp_path);
        return Err(err);
    }

    fsync_dir(dir)?;
    tracing::trace!(path = %final_path.display(), bytes = bytes.len(), "atomic write complete");
    Ok(final_path)
}

fn temp_name(final_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: [u8; 4] = rand::random();
    format!("{final_name}{TEMP_MARKER}{millis}.{}", hex::encode(suffix))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| WriteError::new(path, e))?;
    file.write_all(bytes).map_err(|e| WriteError::new(path, e))?;
    file.sync_all().map_err(|e| WriteError::new(path, e))
}

/// Best-effort temp removal; never masks the original error
fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove temp file"),
    }
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> Result<(), WriteError> {
    let handle = fs::File::open(dir).map_err(|e| WriteError::new(dir, e))?;
    handle.sync_all().map_err(|e| WriteError::new(dir, e))
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> Result<(), WriteError> {
    Ok(())
}

/// Filesystem-safe, lexically sortable UTC stamp, e.g. `2025-01-31T09-15-02-417Z`
#[must_use]
pub fn archive_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Move `dir/live_name` to a fresh timestamped archive name
///
/// An existing archive is never overwritten; a `-N` suffix is added instead.
///
/// # Errors
/// `WriteError` if the rename or directory sync fails
pub fn archive_file(dir: &Path, live_name: &str) -> Result<PathBuf, WriteError> {
    let live = dir.join(live_name);
    let base = format!("{live_name}{ARCHIVE_MARKER}{}", archive_stamp(Utc::now()));

    let mut target = dir.join(&base);
    let mut attempt = 1u32;
    while fs::symlink_metadata(&target).is_ok() {
        target = dir.join(format!("{base}-{attempt}"));
        attempt += 1;
    }

    fs::rename(&live, &target).map_err(|e| WriteError::new(&live, e))?;
    fsync_dir(dir)?;

    tracing::info!(from = %live.display(), to = %target.display(), "archived roadmap");
    Ok(target)
}

/// Archives of `live_name` in `dir`, oldest first
///
/// # Errors
/// `WriteError` if the directory cannot be listed
pub fn list_archives(dir: &Path, live_name: &str) -> Result<Vec<PathBuf>, WriteError> {
    let prefix = format!("{live_name}{ARCHIVE_MARKER}");
    let mut archives: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| WriteError::new(dir, e))?
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&prefix))
        })
        .map(|entry| entry.path())
        .collect();
    archives.sort();
    Ok(archives)
}

/// Remove `<final_name>.tmp.*` files at least `older_than` old
///
/// Such files are debris from a writer that died between creating the temp
/// file and renaming it. Returns the number removed.
///
/// # Errors
/// `WriteError` if the directory cannot be listed
pub fn clean_stale_temps(
    dir: &Path,
    final_name: &str,
    older_than: Duration,
) -> Result<usize, WriteError> {
    let prefix = format!("{final_name}{TEMP_MARKER}");
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in fs::read_dir(dir).map_err(|e| WriteError::new(dir, e))? {
        let Ok(entry) = entry else { continue };
        let is_temp = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if !is_temp {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if !age.is_some_and(|age| age >= older_than) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to remove stale temp file"
            ),
        }
    }

    if removed > 0 {
        tracing::info!(removed, dir = %dir.display(), "removed stale temp files");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "doc.md", b"one").unwrap();
        let path = write_atomic(dir.path(), "doc.md", b"two").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "two");
        assert_eq!(names(dir.path()), ["doc.md"]);
    }

    #[test]
    fn failed_write_removes_temp_and_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "doc.md", b"original").unwrap();

        // Renaming a file over a non-empty directory fails.
        fs::create_dir(dir.path().join("blocker")).unwrap();
        fs::write(dir.path().join("blocker").join("x"), "x").unwrap();
        assert!(write_atomic(dir.path(), "blocker", b"new").is_err());

        assert_eq!(fs::read_to_string(dir.path().join("doc.md")).unwrap(), "original");
        assert!(names(dir.path()).iter().all(|n| !n.contains(TEMP_MARKER)));
    }

    #[test]
    fn temp_names_are_unique() {
        let a = temp_name("doc.md");
        let b = temp_name("doc.md");
        assert!(a.starts_with("doc.md.tmp."));
        assert_ne!(a, b);
    }

    #[test]
    fn stamp_is_filesystem_safe() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 9, 15, 2).unwrap();
        assert_eq!(archive_stamp(at), "2025-01-31T09-15-02-000Z");
    }

    #[test]
    fn archive_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(dir.path(), "doc.md", b"first").unwrap();
        let first = archive_file(dir.path(), "doc.md").unwrap();
        write_atomic(dir.path(), "doc.md", b"second").unwrap();
        let second = archive_file(dir.path(), "doc.md").unwrap();

        assert_ne!(first, second);
        assert!(!dir.path().join("doc.md").exists());
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second");
        assert_eq!(list_archives(dir.path(), "doc.md").unwrap().len(), 2);
    }

    #[test]
    fn archive_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(archive_file(dir.path(), "doc.md").is_err());
    }

    #[test]
    fn clean_only_touches_own_temps() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doc.md.tmp.1.deadbeef"), "debris").unwrap();
        fs::write(dir.path().join("other.md.tmp.1.deadbeef"), "not ours").unwrap();
        fs::write(dir.path().join("doc.md"), "live").unwrap();

        assert_eq!(clean_stale_temps(dir.path(), "doc.md", Duration::from_secs(3600)).unwrap(), 0);
        assert_eq!(clean_stale_temps(dir.path(), "doc.md", Duration::ZERO).unwrap(), 1);
        assert_eq!(names(dir.path()), ["doc.md", "other.md.tmp.1.deadbeef"]);
    }
}
