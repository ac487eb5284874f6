//! Cross-process lock backed by a sentinel file
//!
//! Holders are independent processes, so in-memory primitives are useless
//! here. Acquisition creates the sentinel with `create_new`; a sentinel whose
//! mtime is older than [`LockConfig::stale_after`] is presumed left behind by
//! a crashed holder; one waiter claims it by renaming it aside, then removes
//! it. The file content (holder pid) is diagnostic only.

use crate::error::LockError;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Lock timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Sentinel age after which it is reclaimed
    #[serde(rename = "stale_after_ms", with = "duration_ms")]
    pub stale_after: Duration,
    /// Sleep between attempts
    #[serde(rename = "retry_interval_ms", with = "duration_ms")]
    pub retry_interval: Duration,
    /// Total wait budget
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl LockConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With stale threshold
    #[inline]
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// With retry interval
    #[inline]
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// With wait budget
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            retry_interval: Duration::from_millis(50),
            timeout: Duration::from_secs(5),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(crate) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Lock on one sentinel path
#[derive(Debug, Clone)]
pub struct DirLock {
    path: PathBuf,
    config: LockConfig,
}

impl DirLock {
    /// Create lock handle; nothing touches the filesystem yet
    #[inline]
    pub fn new(path: impl Into<PathBuf>, config: LockConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Sentinel path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Timing in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Block until the lock is held or the wait budget is spent
    ///
    /// # Errors
    /// - `LockError::Timeout` after [`LockConfig::timeout`]
    /// - `LockError::Io` for any other sentinel failure
    pub fn acquire(&self) -> Result<LockGuard, LockError> {
        let started = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire()? {
                return Ok(guard);
            }

            let waited = started.elapsed();
            if waited >= self.config.timeout {
                tracing::debug!(path = %self.path.display(), ?waited, "lock wait budget exhausted");
                return Err(LockError::Timeout {
                    path: self.path.clone(),
                    waited,
                });
            }
            std::thread::sleep(self.config.retry_interval.min(self.config.timeout - waited));
        }
    }

    /// Single attempt, including stale reclaim; `None` if someone else holds it
    ///
    /// # Errors
    /// `LockError::Io` for sentinel failures other than contention
    pub fn try_acquire(&self) -> Result<Option<LockGuard>, LockError> {
        loop {
            match create_sentinel(&self.path) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), "lock acquired");
                    return Ok(Some(LockGuard {
                        path: self.path.clone(),
                        released: false,
                    }));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if !self.reclaim_if_stale()? {
                        return Ok(None);
                    }
                }
                Err(source) => {
                    return Err(LockError::Io {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }
    }

    /// Pid recorded by the current holder, if readable
    #[must_use]
    pub fn holder_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.path).ok()?.trim().parse().ok()
    }

    /// Remove the sentinel if it is stale; true means "try again now"
    ///
    /// The stale file is first renamed to a private name, so of several
    /// waiters that saw it stale exactly one removes it. A waiter whose view
    /// was outdated finds a fresh sentinel under its private name and puts it
    /// back.
    fn reclaim_if_stale(&self) -> Result<bool, LockError> {
        let io_err = |source| LockError::Io {
            path: self.path.clone(),
            source,
        };

        match sentinel_age(&self.path) {
            Ok(age) if age > self.config.stale_after => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(io_err(e)),
        }

        let holder = self.holder_pid();
        let claimed = self.claim_path();
        match fs::rename(&self.path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(io_err(e)),
        }

        match sentinel_age(&claimed) {
            Ok(age) if age > self.config.stale_after => {
                tracing::warn!(
                    path = %self.path.display(),
                    ?age,
                    ?holder,
                    "reclaiming stale lock"
                );
                if let Err(e) = fs::remove_file(&claimed) {
                    tracing::warn!(
                        path = %claimed.display(),
                        error = %e,
                        "failed to remove reclaimed lock"
                    );
                }
                Ok(true)
            }
            _ => {
                self.restore(&claimed);
                Ok(false)
            }
        }
    }

    /// Put back a live sentinel that was claimed from an outdated view
    fn restore(&self, claimed: &Path) {
        let restored = fs::hard_link(claimed, &self.path).or_else(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Err(e),
            _ => fs::rename(claimed, &self.path),
        });
        match restored {
            Ok(()) => tracing::debug!(path = %self.path.display(), "restored live lock"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to restore live lock"
            ),
        }
        if claimed.exists() {
            let _ = fs::remove_file(claimed);
        }
    }

    fn claim_path(&self) -> PathBuf {
        let suffix: [u8; 4] = rand::random();
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".stale.{}", hex::encode(suffix)));
        self.path.with_file_name(name)
    }
}

fn sentinel_age(path: &Path) -> io::Result<Duration> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO))
}

fn create_sentinel(path: &Path) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    if let Err(e) = writeln!(file, "{}", std::process::id()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Held lock; released on [`LockGuard::release`] or drop
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Sentinel path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the sentinel; a sentinel that is already gone is not an error
    ///
    /// # Errors
    /// `LockError::Io` if removal fails for another reason
    pub fn release(mut self) -> Result<(), LockError> {
        self.remove()
    }

    fn remove(&mut self) -> Result<(), LockError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "lock released");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!(error = %e, "failed to release lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> LockConfig {
        LockConfig::new()
            .with_retry_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_millis(100))
    }

    #[test]
    fn acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirLock::new(dir.path().join("doc.lock"), fast());

        let guard = lock.acquire().unwrap();
        assert!(lock.path().exists());
        assert_eq!(lock.holder_pid(), Some(std::process::id()));

        guard.release().unwrap();
        assert!(!lock.path().exists());
    }

    #[test]
    fn second_acquire_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirLock::new(dir.path().join("doc.lock"), fast());

        let _held = lock.acquire().unwrap();
        assert!(lock.try_acquire().unwrap().is_none());

        let err = lock.acquire().unwrap_err();
        assert!(err.is_timeout());
        match err {
            LockError::Timeout { waited, .. } => assert!(waited >= Duration::from_millis(100)),
            LockError::Io { .. } => panic!("expected timeout"),
        }
    }

    #[test]
    fn drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirLock::new(dir.path().join("doc.lock"), fast());
        {
            let _guard = lock.acquire().unwrap();
        }
        assert!(!lock.path().exists());
        assert!(lock.try_acquire().unwrap().is_some());
    }

    #[test]
    fn release_tolerates_missing_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirLock::new(dir.path().join("doc.lock"), fast());

        let guard = lock.acquire().unwrap();
        fs::remove_file(lock.path()).unwrap();
        guard.release().unwrap();
    }

    #[test]
    fn stale_sentinel_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.lock");
        fs::write(&path, "99999\n").unwrap();
        std::thread::sleep(Duration::from_millis(30));

        let lock = DirLock::new(&path, fast().with_stale_after(Duration::from_millis(10)));
        let guard = lock.try_acquire().unwrap();
        assert!(guard.is_some());
        assert_eq!(lock.holder_pid(), Some(std::process::id()));
    }

    fn backdated_sentinel(path: &Path) {
        fs::write(path, "99999\n").unwrap();
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(60))
            .unwrap();
    }

    fn leftover_claims(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".stale."))
            .collect()
    }

    #[test]
    fn racing_waiters_reclaim_stale_sentinel_once() {
        use std::sync::{Arc, Barrier};

        for _ in 0..50 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("doc.lock");
            backdated_sentinel(&path);

            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let lock = DirLock::new(&path, fast());
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        let guard = lock.try_acquire().unwrap();
                        let won = guard.is_some();
                        // Hold until both have tried.
                        barrier.wait();
                        won
                    })
                })
                .collect();

            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();
            assert_eq!(winners, 1);
            assert!(!path.exists());
            assert!(leftover_claims(dir.path()).is_empty());
        }
    }

    #[test]
    fn claimed_live_sentinel_is_put_back() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirLock::new(dir.path().join("doc.lock"), fast());
        let guard = lock.acquire().unwrap();

        let claimed = lock.claim_path();
        fs::rename(lock.path(), &claimed).unwrap();
        lock.restore(&claimed);

        assert!(lock.path().exists());
        assert!(leftover_claims(dir.path()).is_empty());
        assert!(lock.try_acquire().unwrap().is_none());
        guard.release().unwrap();
    }

    #[test]
    fn fresh_sentinel_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.lock");
        fs::write(&path, "99999\n").unwrap();

        let lock = DirLock::new(&path, fast());
        assert!(lock.try_acquire().unwrap().is_none());
        assert_eq!(lock.holder_pid(), Some(99999));
        assert!(leftover_claims(dir.path()).is_empty());
    }

    #[test]
    fn config_uses_milliseconds() {
        let config: LockConfig = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.stale_after, Duration::from_secs(30));

        let json = serde_json::to_value(LockConfig::default()).unwrap();
        assert_eq!(json["retry_interval_ms"], 50);
    }
}
