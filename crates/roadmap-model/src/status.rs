//! Action status and transition policy
//!
//! Two policies exist:
//! - [`TransitionPolicy::Permissive`] (default): any change is allowed except
//!   out of `cancelled`. Reverting and skipping are fine.
//! - [`TransitionPolicy::Strict`]: forward-only `pending` → `in_progress` →
//!   `completed`, one step at a time. `cancelled` is not available and
//!   `completed` is terminal.
//!
//! Requesting the current status again is a no-op under both policies.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

const ALL_NAMES: &str = "pending, in_progress, completed, cancelled";
const STRICT_NAMES: &str = "pending, in_progress, completed";

/// Lifecycle state of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not started; every action is created in this state
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Abandoned; terminal under every policy
    Cancelled,
}

impl Status {
    /// Every status, in lifecycle order
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether work remains on an action in this state
    #[inline]
    #[must_use]
    pub fn is_incomplete(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ModelError::InvalidStatus {
                value: s.to_string(),
                allowed: ALL_NAMES,
            })
    }
}

/// Which status changes an update may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Anything except leaving `cancelled`
    #[default]
    Permissive,
    /// Single forward steps only, no `cancelled`
    Strict,
}

impl TransitionPolicy {
    /// Statuses a client may request under this policy
    #[must_use]
    pub fn allowed_statuses(self) -> &'static [Status] {
        match self {
            Self::Permissive => &Status::ALL,
            Self::Strict => &Status::ALL[..3],
        }
    }

    fn allowed_names(self) -> &'static str {
        match self {
            Self::Permissive => ALL_NAMES,
            Self::Strict => STRICT_NAMES,
        }
    }

    /// Whether `status` accepts no further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self, status: Status) -> bool {
        match self {
            Self::Permissive => status == Status::Cancelled,
            Self::Strict => matches!(status, Status::Completed | Status::Cancelled),
        }
    }

    /// Statuses reachable from `from` (including staying put)
    #[must_use]
    pub fn allowed_transitions(self, from: Status) -> Vec<Status> {
        use Status::*;
        if self.is_terminal(from) {
            return Vec::new();
        }
        match self {
            Self::Permissive => Status::ALL.to_vec(),
            Self::Strict => match from {
                Pending => vec![Pending, InProgress],
                InProgress => vec![InProgress, Completed],
                Completed | Cancelled => Vec::new(),
            },
        }
    }
}

/// Validate a requested status change and return the parsed target
///
/// `cancelled` is checked first, so an action in that state reports
/// `TerminalState` whatever was requested.
///
/// # Errors
/// - `ModelError::TerminalState` if `current` is terminal under `policy`
/// - `ModelError::InvalidStatus` if `requested` is unknown or not allowed by `policy`
/// - `ModelError::IllegalTransition` if `policy` forbids the step
pub fn validate_status_transition(
    policy: TransitionPolicy,
    current: Status,
    requested: &str,
) -> Result<Status, ModelError> {
    if current == Status::Cancelled {
        return Err(ModelError::TerminalState(current));
    }

    let to = requested
        .parse::<Status>()
        .ok()
        .filter(|status| policy.allowed_statuses().contains(status))
        .ok_or_else(|| ModelError::InvalidStatus {
            value: requested.to_string(),
            allowed: policy.allowed_names(),
        })?;

    if policy.is_terminal(current) {
        return Err(ModelError::TerminalState(current));
    }

    if policy.allowed_transitions(current).contains(&to) {
        Ok(to)
    } else {
        Err(ModelError::IllegalTransition { from: current, to })
    }
}
