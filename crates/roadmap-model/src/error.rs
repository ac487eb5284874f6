//! Error types for identifier and status checks

use crate::status::Status;
use std::fmt::{self, Display, Formatter};

/// Which identifier grammar a value failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// `^[0-9]+$`
    Feature,
    /// `^[0-9]+\.[0-9]{2}$`
    Action,
}

impl IdKind {
    /// Human-readable shape of a valid identifier
    #[inline]
    #[must_use]
    pub fn expected_shape(self) -> &'static str {
        match self {
            Self::Feature => "digits only, e.g. \"1\"",
            Self::Action => "feature digits, a dot and two digits, e.g. \"1.01\"",
        }
    }
}

impl Display for IdKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feature => f.write_str("feature number"),
            Self::Action => f.write_str("action number"),
        }
    }
}

/// Errors from the identifier and status model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Identifier does not match its grammar
    #[error("invalid {kind} '{value}': expected {}", .kind.expected_shape())]
    InvalidFormat {
        /// Grammar that was applied
        kind: IdKind,
        /// Offending input
        value: String,
    },

    /// Requested status is not part of the allowed set
    #[error("invalid status '{value}': expected one of {allowed}")]
    InvalidStatus {
        /// Offending input
        value: String,
        /// Allowed status names, comma separated
        allowed: &'static str,
    },

    /// Current status accepts no further transitions
    #[error("status '{0}' is terminal, no further transitions are allowed")]
    TerminalState(Status),

    /// Transition rejected by the active policy
    #[error("status transition '{from}' -> '{to}' is not allowed")]
    IllegalTransition {
        /// Current status
        from: Status,
        /// Requested status
        to: Status,
    },
}

impl ModelError {
    /// Create format error for identifier
    #[inline]
    pub fn invalid_format(kind: IdKind, value: impl Into<String>) -> Self {
        Self::InvalidFormat {
            kind,
            value: value.into(),
        }
    }
}
