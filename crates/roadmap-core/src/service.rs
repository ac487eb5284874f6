//! Roadmap service
//!
//! Glue between the merge engine and the store. Every mutation is a pure
//! transform handed to [`RoadmapStore::update`], so merging new work and
//! updating one action serialize through the same lock and need no
//! reconciliation with each other.

use crate::config::RoadmapConfig;
use crate::error::RoadmapError;
use roadmap_merge::{merge, update_action, ActionPatch, MergeReport, ProposedFeature};
use roadmap_model::{Action, RoadmapDocument, Status, TransitionPolicy};
use roadmap_store::{Commit, RoadmapStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Create-or-merge request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Project label; required on creation, replaces the stored one otherwise
    #[serde(default)]
    pub feature: Option<String>,
    /// Free-text spec; required on creation, replaces the stored one otherwise
    #[serde(default)]
    pub spec: Option<String>,
    /// Features and actions to add
    #[serde(default)]
    pub features: Vec<ProposedFeature>,
}

impl Proposal {
    /// Proposal without metadata
    #[inline]
    pub fn new(features: Vec<ProposedFeature>) -> Self {
        Self {
            feature: None,
            spec: None,
            features,
        }
    }

    /// With project label
    #[inline]
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// With spec text
    #[inline]
    #[must_use]
    pub fn with_spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }
}

/// Result of [`RoadmapService::create_or_merge`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Document as written
    pub document: RoadmapDocument,
    /// What the merge added or skipped
    pub report: MergeReport,
    /// Whether this call created the roadmap
    pub created: bool,
}

/// Result of [`RoadmapService::update_action`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    /// Action as written
    pub action: Action,
    /// Status before the update
    pub previous_status: Status,
    /// Nothing incomplete remained, so the roadmap was archived
    pub archived: bool,
}

/// Roadmap operations for one project directory
#[derive(Debug)]
pub struct RoadmapService {
    store: RoadmapStore,
    policy: TransitionPolicy,
}

impl RoadmapService {
    /// Open service over `dir`
    ///
    /// # Errors
    /// `RoadmapError::Store` if the directory or file name is unusable
    pub fn open(dir: impl Into<PathBuf>, config: RoadmapConfig) -> Result<Self, RoadmapError> {
        let store = RoadmapStore::open(dir, config.store)?;
        Ok(Self {
            store,
            policy: config.transition_policy,
        })
    }

    /// Open service over `dir` using `<dir>/roadmap.toml` if it exists
    ///
    /// # Errors
    /// `RoadmapError::Config` or `RoadmapError::Store`
    pub fn discover(dir: impl Into<PathBuf>) -> Result<Self, RoadmapError> {
        let dir = dir.into();
        let config = RoadmapConfig::discover(&dir)?;
        Self::open(dir, config)
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RoadmapStore {
        &self.store
    }

    /// Transition policy in effect
    #[inline]
    #[must_use]
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Whether a live roadmap exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.store.exists()
    }

    /// Current roadmap, if any
    ///
    /// # Errors
    /// `RoadmapError::Store` if the file is unreadable or corrupt
    pub fn get(&self) -> Result<Option<RoadmapDocument>, RoadmapError> {
        Ok(self.store.read()?)
    }

    /// Create the roadmap or merge new features and actions into it
    ///
    /// # Errors
    /// - `RoadmapError::MissingMetadata` when creating without `feature`/`spec`
    /// - `RoadmapError::Merge` for invalid or conflicting proposals
    /// - `RoadmapError::Store` for storage failures
    pub fn create_or_merge(&self, proposal: Proposal) -> Result<MergeOutcome, RoadmapError> {
        let outcome = self.store.update(|current| {
            let created = current.is_none();
            let (feature, spec, existing) = match current {
                Some(doc) => (
                    proposal.feature.unwrap_or(doc.feature),
                    proposal.spec.unwrap_or(doc.spec),
                    Some(doc.roadmap),
                ),
                None => (
                    proposal.feature.ok_or(RoadmapError::MissingMetadata("feature"))?,
                    proposal.spec.ok_or(RoadmapError::MissingMetadata("spec"))?,
                    None,
                ),
            };

            let merged = merge(existing.as_ref(), &proposal.features)?;
            let document = RoadmapDocument::new(feature, spec, merged.roadmap);
            let outcome = MergeOutcome {
                document: document.clone(),
                report: merged.report,
                created,
            };
            Ok::<_, RoadmapError>(Commit::new(document, outcome))
        })?;

        tracing::info!(
            "{} roadmap: {} features and {} actions added, {} actions skipped",
            if outcome.created { "Created" } else { "Merged into" },
            outcome.report.added_features.len(),
            outcome.report.added_actions.len(),
            outcome.report.skipped_actions.len()
        );
        Ok(outcome)
    }

    /// Change one action's description and/or status
    ///
    /// Archives the roadmap in the same locked step when no pending or
    /// in-progress action remains.
    ///
    /// # Errors
    /// - `RoadmapError::NoRoadmap` if there is nothing to update
    /// - `RoadmapError::Update` for bad numbers, missing actions or rejected transitions
    /// - `RoadmapError::Store` for storage failures
    pub fn update_action(
        &self,
        number: &str,
        patch: &ActionPatch,
    ) -> Result<ActionOutcome, RoadmapError> {
        let path = self.store.document_path();
        let policy = self.policy;

        let outcome = self.store.update(|current| {
            let mut document = current.ok_or(RoadmapError::NoRoadmap { path })?;
            let update = update_action(&mut document.roadmap, number, patch, policy)?;
            let archive = update.archive_requested;
            let outcome = ActionOutcome {
                action: update.action,
                previous_status: update.previous_status,
                archived: archive,
            };
            Ok::<_, RoadmapError>(Commit::new(document, outcome).with_archive(archive))
        })?;

        tracing::info!(
            "Action {}: {} -> {}",
            outcome.action.number,
            outcome.previous_status,
            outcome.action.status
        );
        if outcome.archived {
            tracing::info!("All actions complete, roadmap archived");
        }
        Ok(outcome)
    }

    /// Archive the live roadmap now
    ///
    /// # Errors
    /// - `RoadmapError::NoRoadmap` if there is none
    /// - `RoadmapError::Store` for storage failures
    pub fn archive(&self) -> Result<PathBuf, RoadmapError> {
        self.store.archive().map_err(|e| match e {
            StoreError::NoDocument { path } => RoadmapError::NoRoadmap { path },
            other => other.into(),
        })
    }

    /// Archived roadmaps, oldest first
    ///
    /// # Errors
    /// `RoadmapError::Store` if the directory cannot be listed
    pub fn archives(&self) -> Result<Vec<PathBuf>, RoadmapError> {
        Ok(self.store.archives()?)
    }

    /// Project directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.store.dir()
    }
}
