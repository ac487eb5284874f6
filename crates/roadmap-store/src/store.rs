//! Storage façade
//!
//! The only way documents are persisted. Every mutation runs under the
//! directory lock and lands through the atomic writer, so there is at most
//! one mutation in flight per directory and a failed call leaves the file
//! exactly as it was. Reads take no lock: rename-based writes mean a reader
//! sees either the old or the new document.

use crate::atomic;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::lock::{DirLock, LockGuard};
use roadmap_codec::{DocumentCodec, MarkdownCodec};
use roadmap_model::RoadmapDocument;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What an update transform asks the store to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit<R> {
    /// Document to write
    pub document: RoadmapDocument,
    /// Value handed back to the caller after the write
    pub value: R,
    /// Archive the document right after writing it
    pub archive: bool,
}

impl<R> Commit<R> {
    /// Commit without archival
    #[inline]
    pub fn new(document: RoadmapDocument, value: R) -> Self {
        Self {
            document,
            value,
            archive: false,
        }
    }

    /// Set archival flag
    #[inline]
    #[must_use]
    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }
}

/// Roadmap document store for one project directory
#[derive(Debug)]
pub struct RoadmapStore<C = MarkdownCodec> {
    dir: PathBuf,
    config: StoreConfig,
    lock: DirLock,
    codec: C,
}

impl RoadmapStore<MarkdownCodec> {
    /// Open store in `dir` with the markdown codec
    ///
    /// # Errors
    /// - `StoreError::Io` if `dir` is not an accessible directory
    /// - `StoreError::InvalidFileName` for a bad configured name
    pub fn open(dir: impl Into<PathBuf>, config: StoreConfig) -> Result<Self, StoreError> {
        Self::with_codec(dir, config, MarkdownCodec)
    }
}

impl<C: DocumentCodec> RoadmapStore<C> {
    /// Open store with a custom codec
    ///
    /// # Errors
    /// Same as [`RoadmapStore::open`]
    pub fn with_codec(
        dir: impl Into<PathBuf>,
        config: StoreConfig,
        codec: C,
    ) -> Result<Self, StoreError> {
        let dir = dir.into();

        let name = config.file_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(StoreError::InvalidFileName {
                name: config.file_name,
            });
        }

        let meta = fs::metadata(&dir).map_err(|e| StoreError::io(&dir, e))?;
        if !meta.is_dir() {
            return Err(StoreError::io(
                &dir,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        let lock = DirLock::new(dir.join(config.lock_file_name()), config.lock);
        tracing::debug!(
            dir = %dir.display(),
            file = %config.file_name,
            codec = codec.name(),
            "opened roadmap store"
        );
        Ok(Self {
            dir,
            config,
            lock,
            codec,
        })
    }

    /// Project directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Configuration in effect
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Live document path
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.dir.join(&self.config.file_name)
    }

    /// Lock sentinel path
    #[inline]
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        self.lock.path()
    }

    /// Whether a live document file is present
    #[must_use]
    pub fn exists(&self) -> bool {
        self.document_path().is_file()
    }

    /// Decode the live document; `None` if missing or blank
    ///
    /// # Errors
    /// - `StoreError::Codec` if the file is corrupt
    /// - `StoreError::Io` if it cannot be read
    pub fn read(&self) -> Result<Option<RoadmapDocument>, StoreError> {
        let path = self.document_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(self.codec.decode(&text)?))
    }

    /// Overwrite the document unconditionally
    ///
    /// # Errors
    /// - `StoreError::Codec` if the document is invalid
    /// - `StoreError::Lock` / `StoreError::Write` from locking or writing
    pub fn write(&self, document: &RoadmapDocument) -> Result<(), StoreError> {
        let text = self.codec.encode(document)?;
        let guard = self.lock.acquire()?;
        self.persist(&text)?;
        finish(guard);
        Ok(())
    }

    /// Read-transform-write under the lock
    ///
    /// `transform` receives the current document (or `None`). If it fails,
    /// nothing is written and its error is returned. Otherwise the committed
    /// document is written atomically, archived if requested while still
    /// under the lock, and `value` is returned.
    ///
    /// # Errors
    /// The transform's error, or any `StoreError` converted into `E`
    pub fn update<R, E, F>(&self, transform: F) -> Result<R, E>
    where
        F: FnOnce(Option<RoadmapDocument>) -> Result<Commit<R>, E>,
        E: From<StoreError>,
    {
        let guard = self.lock.acquire().map_err(StoreError::from)?;

        let current = self.read()?;
        let commit = transform(current)?;

        let text = self.codec.encode(&commit.document).map_err(StoreError::from)?;
        self.persist(&text)?;
        tracing::debug!(
            path = %self.document_path().display(),
            actions = commit.document.roadmap.action_count(),
            archive = commit.archive,
            "committed roadmap"
        );

        if commit.archive {
            self.archive_locked()?;
        }

        finish(guard);
        Ok(commit.value)
    }

    /// Archive the live document now
    ///
    /// # Errors
    /// - `StoreError::NoDocument` if there is nothing to archive
    /// - `StoreError::Lock` / `StoreError::Write` from locking or renaming
    pub fn archive(&self) -> Result<PathBuf, StoreError> {
        let guard = self.lock.acquire()?;
        let archived = self.archive_locked()?;
        finish(guard);
        Ok(archived)
    }

    /// Archived documents, oldest first
    ///
    /// # Errors
    /// `StoreError::Write` if the directory cannot be listed
    pub fn archives(&self) -> Result<Vec<PathBuf>, StoreError> {
        Ok(atomic::list_archives(&self.dir, &self.config.file_name)?)
    }

    /// Remove temp-file debris older than `older_than`; returns the count
    ///
    /// # Errors
    /// `StoreError::Lock` / `StoreError::Write`
    pub fn clean_stale_temps(&self, older_than: Duration) -> Result<usize, StoreError> {
        let guard = self.lock.acquire()?;
        let removed = atomic::clean_stale_temps(&self.dir, &self.config.file_name, older_than)?;
        finish(guard);
        Ok(removed)
    }

    fn persist(&self, text: &str) -> Result<(), StoreError> {
        atomic::write_atomic(&self.dir, &self.config.file_name, text.as_bytes())?;
        Ok(())
    }

    fn archive_locked(&self) -> Result<PathBuf, StoreError> {
        if !self.exists() {
            return Err(StoreError::NoDocument {
                path: self.document_path(),
            });
        }
        Ok(atomic::archive_file(&self.dir, &self.config.file_name)?)
    }
}

/// Release after a completed operation; the data is already durable, so a
/// failed release is logged rather than reported
fn finish(guard: LockGuard) {
    if let Err(e) = guard.release() {
        tracing::warn!(error = %e, "failed to release lock after commit");
    }
}
