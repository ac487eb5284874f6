//! Single-action updates: description overwrite and status change

use crate::error::UpdateError;
use roadmap_model::{
    validate_status_transition, Action, ActionNumber, ModelError, Roadmap, Status,
    TransitionPolicy,
};
use serde::{Deserialize, Serialize};

/// Requested change to one action; at least one field must be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPatch {
    /// Replacement description (full overwrite)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Requested status name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ActionPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With replacement description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With requested status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Whether nothing would change
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none()
    }
}

/// Result of a successful update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionUpdate {
    /// Action after the update
    pub action: Action,
    /// Status before the update
    pub previous_status: Status,
    /// No pending or in-progress action remains anywhere in the tree
    pub archive_requested: bool,
}

/// Apply `patch` to action `number` in place
///
/// Nothing is modified unless every check passes. A terminal action
/// rejects description changes as well as status changes.
///
/// # Errors
/// - `UpdateError::InvalidFormat` for a malformed number
/// - `UpdateError::EmptyPatch` / `UpdateError::EmptyDescription` for a useless patch
/// - `UpdateError::NotFound` if the action does not exist
/// - `UpdateError::Model` if the status rules reject the change
pub fn update_action(
    roadmap: &mut Roadmap,
    number: &str,
    patch: &ActionPatch,
    policy: TransitionPolicy,
) -> Result<ActionUpdate, UpdateError> {
    let number = ActionNumber::parse(number).map_err(UpdateError::InvalidFormat)?;

    if patch.is_empty() {
        return Err(UpdateError::EmptyPatch { number });
    }
    if patch.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(UpdateError::EmptyDescription { number });
    }

    let Some(action) = roadmap.action_mut(&number) else {
        return Err(UpdateError::NotFound { number });
    };
    let previous_status = action.status;

    let status = match patch.status.as_deref() {
        Some(requested) => Some(validate_status_transition(policy, previous_status, requested)),
        None if policy.is_terminal(previous_status) => {
            Some(Err(ModelError::TerminalState(previous_status)))
        }
        None => None,
    }
    .transpose()
    .map_err(|source| UpdateError::Model {
        number: number.clone(),
        source,
    })?;

    if let Some(description) = &patch.description {
        action.description.clone_from(description);
    }
    if let Some(status) = status {
        action.status = status;
    }
    let action = action.clone();

    let archive_requested = !roadmap.has_incomplete_actions();
    tracing::debug!(
        action = %number,
        from = %previous_status,
        to = %action.status,
        archive_requested,
        "updated action"
    );

    Ok(ActionUpdate {
        action,
        previous_status,
        archive_requested,
    })
}
