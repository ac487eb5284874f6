//! Roadmap tree: features holding ordered actions
//!
//! The tree types are plain data. Ordering and uniqueness are checked by
//! [`Roadmap::validate`], which every persisted document passes through.

use crate::ids::{ActionNumber, FeatureNumber};
use crate::issues::Issues;
use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Concrete unit of work under a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Immutable identifier
    pub number: ActionNumber,
    /// Free text, replaced wholesale on update
    pub description: String,
    /// Lifecycle state
    #[serde(default)]
    pub status: Status,
}

impl Action {
    /// Create pending action
    #[inline]
    pub fn new(number: ActionNumber, description: impl Into<String>) -> Self {
        Self {
            number,
            description: description.into(),
            status: Status::Pending,
        }
    }

    /// With explicit status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Top-level grouping; number, title and description never change once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Immutable identifier
    pub number: FeatureNumber,
    /// Immutable title
    pub title: String,
    /// Immutable description
    pub description: String,
    /// Actions in ascending numeric order
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Feature {
    /// Create feature without actions
    #[inline]
    pub fn new(
        number: FeatureNumber,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            number,
            title: title.into(),
            description: description.into(),
            actions: Vec::new(),
        }
    }

    /// Add action, keeping numeric order
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self.sort_actions();
        self
    }

    /// Restore ascending numeric action order
    #[inline]
    pub fn sort_actions(&mut self) {
        self.actions.sort_by(|a, b| a.number.cmp(&b.number));
    }

    /// Look up action by number
    #[must_use]
    pub fn action(&self, number: &ActionNumber) -> Option<&Action> {
        self.actions
            .iter()
            .find(|a| a.number.numeric_key() == number.numeric_key())
    }

    /// Number of actions still pending or in progress
    #[must_use]
    pub fn incomplete_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.status.is_incomplete())
            .count()
    }
}

/// Whole task tree of one project directory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Roadmap {
    /// Features in ascending numeric order
    pub features: Vec<Feature>,
}

impl Roadmap {
    /// Create empty roadmap (only valid as an intermediate value)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add feature, keeping numeric order
    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self.sort_features();
        self
    }

    /// Restore ascending numeric feature order
    #[inline]
    pub fn sort_features(&mut self) {
        self.features.sort_by(|a, b| a.number.cmp(&b.number));
    }

    /// Look up feature by number
    #[must_use]
    pub fn feature(&self, number: &FeatureNumber) -> Option<&Feature> {
        self.features.iter().find(|f| f.number.same_as(number))
    }

    /// Look up feature by number, mutably
    pub fn feature_mut(&mut self, number: &FeatureNumber) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.number.same_as(number))
    }

    /// Look up action by number through its owning feature
    #[must_use]
    pub fn action(&self, number: &ActionNumber) -> Option<&Action> {
        self.features
            .iter()
            .filter(|f| number.belongs_to(&f.number))
            .find_map(|f| f.action(number))
    }

    /// Look up action by number, mutably
    pub fn action_mut(&mut self, number: &ActionNumber) -> Option<&mut Action> {
        self.features
            .iter_mut()
            .filter(|f| number.belongs_to(&f.number))
            .flat_map(|f| f.actions.iter_mut())
            .find(|a| a.number.numeric_key() == number.numeric_key())
    }

    /// Iterate every action in tree order
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.features.iter().flat_map(|f| f.actions.iter())
    }

    /// Total action count
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.features.iter().map(|f| f.actions.len()).sum()
    }

    /// Whether any action is still pending or in progress
    #[must_use]
    pub fn has_incomplete_actions(&self) -> bool {
        self.actions().any(|a| a.status.is_incomplete())
    }

    /// Check every structural invariant of a persisted tree
    ///
    /// # Errors
    /// All violations found, in tree order
    pub fn validate(&self) -> Result<(), Issues> {
        let mut issues = Issues::new();

        if self.features.is_empty() {
            issues.push("roadmap", "must contain at least one feature");
        }

        let mut seen_features: HashSet<&str> = HashSet::new();
        let mut seen_actions: HashSet<(&str, &str)> = HashSet::new();
        let mut prev_feature: Option<&FeatureNumber> = None;

        for feature in &self.features {
            let subject = format!("feature {}", feature.number);

            if !seen_features.insert(feature.number.numeric_key()) {
                issues.push(&subject, "duplicate feature number");
            } else if prev_feature.is_some_and(|prev| prev > &feature.number) {
                issues.push(&subject, "features are not in ascending numeric order");
            }
            prev_feature = Some(&feature.number);

            if feature.title.trim().is_empty() {
                issues.push(&subject, "title must not be empty");
            }
            if feature.description.trim().is_empty() {
                issues.push(&subject, "description must not be empty");
            }
            if feature.actions.is_empty() {
                issues.push(&subject, "must contain at least one action");
            }

            let mut prev_action: Option<&ActionNumber> = None;
            for action in &feature.actions {
                let subject = format!("action {}", action.number);

                if !action.number.belongs_to(&feature.number) {
                    issues.push(
                        &subject,
                        format!("prefix does not match enclosing feature {}", feature.number),
                    );
                }
                if !seen_actions.insert(action.number.numeric_key()) {
                    issues.push(&subject, "duplicate action number");
                } else if prev_action.is_some_and(|prev| prev > &action.number) {
                    issues.push(&subject, "actions are not in ascending numeric order");
                }
                prev_action = Some(&action.number);

                if action.description.trim().is_empty() {
                    issues.push(&subject, "description must not be empty");
                }
            }
        }

        issues.into_result()
    }
}

/// Persisted unit: the tree plus two free-text metadata fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapDocument {
    /// Short project/feature label
    pub feature: String,
    /// Multi-line free text
    pub spec: String,
    /// Task tree
    pub roadmap: Roadmap,
}

impl RoadmapDocument {
    /// Create document, normalizing both metadata fields
    pub fn new(feature: impl AsRef<str>, spec: impl AsRef<str>, roadmap: Roadmap) -> Self {
        Self {
            feature: feature.as_ref().trim().to_string(),
            spec: normalize_block(spec.as_ref()),
            roadmap,
        }
    }

    /// Validate the tree
    ///
    /// # Errors
    /// All tree violations found
    #[inline]
    pub fn validate(&self) -> Result<(), Issues> {
        self.roadmap.validate()
    }
}

/// Normalize free text: unify line breaks to `\n`, right-trim lines, strip
/// the common indent of non-blank lines and drop leading/trailing blank lines
#[must_use]
pub fn normalize_block(text: &str) -> String {
    let text = text
        .replace("\r\n", "\n")
        .replace(['\r', '\u{85}', '\u{2028}', '\u{2029}'], "\n");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    // Only ASCII blanks count as indent so the byte offset stays on a char boundary.
    let indent = lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };

    lines[start..=end]
        .iter()
        .map(|&l| if l.is_empty() { l } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}
