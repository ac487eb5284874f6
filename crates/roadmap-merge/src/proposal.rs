//! Client input for merges
//!
//! Fields are raw strings: nothing here is trusted until
//! [`validate_proposal`](crate::validate_proposal) has run. There is no status
//! field because new actions always start `pending`.

use serde::{Deserialize, Serialize};

/// Proposed action under a proposed feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAction {
    /// Action number, e.g. `1.02`
    pub number: String,
    /// Action text
    pub description: String,
}

impl ProposedAction {
    /// Create proposed action
    #[inline]
    pub fn new(number: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            description: description.into(),
        }
    }
}

/// Proposed feature; for an existing number, title and description must
/// repeat the stored values exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedFeature {
    /// Feature number, e.g. `1`
    pub number: String,
    /// Feature title
    pub title: String,
    /// Feature description
    pub description: String,
    /// Proposed actions, any order
    #[serde(default)]
    pub actions: Vec<ProposedAction>,
}

impl ProposedFeature {
    /// Create proposed feature without actions
    #[inline]
    pub fn new(
        number: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            description: description.into(),
            actions: Vec::new(),
        }
    }

    /// With additional action
    #[inline]
    #[must_use]
    pub fn with_action(
        mut self,
        number: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.actions.push(ProposedAction::new(number, description));
        self
    }
}
