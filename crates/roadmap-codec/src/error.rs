//! Error types for the document codec
//!
//! - [`FormatError`]: the text cannot be read as a roadmap document at all
//! - [`CodecError::Schema`]: it parsed, but the tree breaks an invariant

use roadmap_model::{Issues, ModelError};

/// The stored text is not a well-formed roadmap document
///
/// One variant per failure mode so callers and operators can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Document does not open with a `---` line
    #[error("missing metadata block: document must start with a '---' line")]
    MissingMetadata,

    /// Opening `---` without a closing one
    #[error("unterminated metadata block: no closing '---' line")]
    UnterminatedMetadata,

    /// Metadata is not a YAML mapping
    #[error("invalid metadata block: {0}")]
    InvalidMetadata(String),

    /// Required metadata field absent or null
    #[error("missing required metadata field '{0}'")]
    MissingField(&'static str),

    /// Metadata field is a list or mapping
    #[error("metadata field '{0}' must be a scalar")]
    InvalidField(&'static str),

    /// No fenced `yaml` block after the metadata
    #[error("missing task block: expected a fenced yaml block after the metadata")]
    MissingTaskBlock,

    /// Task block fence never closed
    #[error("unterminated task block: closing fence not found")]
    UnterminatedTaskBlock,

    /// Task block is not valid YAML or has the wrong shape
    #[error("invalid task block: {0}")]
    InvalidTaskBlock(String),

    /// Task block holds no features
    #[error("task block contains no features")]
    EmptyTaskBlock,

    /// Feature or action number breaks its grammar
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[source] ModelError),

    /// Action listed under a feature it does not belong to
    #[error("action {action} does not belong to enclosing feature {feature}")]
    ActionPrefixMismatch {
        /// Enclosing feature number
        feature: String,
        /// Offending action number
        action: String,
    },

    /// Status token is not one of the known statuses
    #[error("action {action} has unknown status '{status}'")]
    UnknownStatus {
        /// Action number
        action: String,
        /// Offending token
        status: String,
    },

    /// Feature without description text
    #[error("feature {0} has an empty description")]
    EmptyFeatureDescription(String),

    /// Feature without actions
    #[error("feature {0} has no actions")]
    FeatureWithoutActions(String),
}

/// Any codec failure
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text is not a well-formed document
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Tree parsed but violates structural invariants
    #[error("schema error: {0}")]
    Schema(#[from] Issues),

    /// Emitting YAML failed
    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl CodecError {
    /// Whether the failure came from reading text (as opposed to writing it)
    #[inline]
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Schema(_))
    }
}

impl From<serde_yaml::Error> for CodecError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_display() {
        let err = FormatError::ActionPrefixMismatch {
            feature: "1".to_string(),
            action: "2.01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "action 2.01 does not belong to enclosing feature 1"
        );
    }

    #[test]
    fn error_conversions() {
        let err: CodecError = FormatError::MissingTaskBlock.into();
        assert!(matches!(err, CodecError::Format(FormatError::MissingTaskBlock)));
        assert!(err.is_corruption());

        let mut issues = Issues::new();
        issues.push("roadmap", "must contain at least one feature");
        let err: CodecError = issues.into();
        assert!(err.to_string().starts_with("schema error: 1 issue"));
    }
}
