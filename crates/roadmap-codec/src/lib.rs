//! Roadmap document codec
//!
//! Converts between a [`RoadmapDocument`] and the human-readable markdown
//! file kept in the project directory:
//!
//! ````text
//! ---
//! feature: Auth
//! spec: |2-
//!   Free text
//! ---
//!
//! # Roadmap
//!
//! ```yaml
//! features:
//! - number: '1'
//!   ...
//! ```
//! ````
//!
//! Decoding is strict. Every malformed input is reported as a distinct
//! [`FormatError`], and a tree that parses but breaks an invariant is a
//! [`CodecError::Schema`]. Nothing is silently coerced.
//!
//! # Example
//!
//! ```rust
//! use roadmap_codec::{decode, encode};
//! use roadmap_model::{Action, Feature, Roadmap, RoadmapDocument};
//!
//! let doc = RoadmapDocument::new(
//!     "Auth",
//!     "Login system",
//!     Roadmap::new().with_feature(
//!         Feature::new("1".parse().unwrap(), "Auth", "Login")
//!             .with_action(Action::new("1.01".parse().unwrap(), "Build form")),
//!     ),
//! );
//! let text = encode(&doc).unwrap();
//! assert_eq!(decode(&text).unwrap(), doc);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod body;
pub mod error;
mod metadata;

pub use body::TASK_BLOCK_LANG;
pub use error::{CodecError, FormatError};

use roadmap_model::RoadmapDocument;

/// Heading written between the metadata and the task block
pub const ROADMAP_HEADING: &str = "# Roadmap";

/// Serialize a document
///
/// # Errors
/// - `CodecError::Schema` if the tree is invalid; such a file could not be read back
/// - `CodecError::Serialize` if YAML emission fails or the text would not
///   read back as the same document
pub fn encode(document: &RoadmapDocument) -> Result<String, CodecError> {
    document.validate()?;

    let mut out = metadata::render(&document.feature, &document.spec)?;
    out.push('\n');
    out.push_str(ROADMAP_HEADING);
    out.push_str("\n\n");
    out.push_str(&body::render(&document.roadmap)?);

    // Never hand out text that the next reader would reject or alter.
    let expected = RoadmapDocument::new(
        &document.feature,
        &document.spec,
        document.roadmap.clone(),
    );
    match decode(&out) {
        Ok(decoded) if decoded == expected => Ok(out),
        Ok(_) => Err(CodecError::Serialize(
            "encoded text does not read back as the same document".to_string(),
        )),
        Err(e) => Err(CodecError::Serialize(format!(
            "encoded text does not read back: {e}"
        ))),
    }
}

/// Parse and validate a document
///
/// # Errors
/// - `CodecError::Format` for any structural defect in the text
/// - `CodecError::Schema` if the parsed tree breaks an invariant
pub fn decode(text: &str) -> Result<RoadmapDocument, CodecError> {
    let (yaml, rest) = metadata::split(text)?;
    let meta = metadata::parse(yaml)?;
    let block = body::extract(rest)?;
    let roadmap = body::parse(&block)?;
    roadmap.validate()?;

    tracing::trace!(
        features = roadmap.features.len(),
        actions = roadmap.action_count(),
        "decoded roadmap document"
    );
    Ok(RoadmapDocument::new(meta.feature, meta.spec, roadmap))
}

/// Seam between the store and the on-disk representation
pub trait DocumentCodec: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Serialize a document
    ///
    /// # Errors
    /// Any [`CodecError`]
    fn encode(&self, document: &RoadmapDocument) -> Result<String, CodecError>;

    /// Parse a document
    ///
    /// # Errors
    /// Any [`CodecError`]
    fn decode(&self, text: &str) -> Result<RoadmapDocument, CodecError>;
}

/// Markdown with metadata header and fenced YAML task block
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownCodec;

impl DocumentCodec for MarkdownCodec {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn encode(&self, document: &RoadmapDocument) -> Result<String, CodecError> {
        encode(document)
    }

    fn decode(&self, text: &str) -> Result<RoadmapDocument, CodecError> {
        decode(text)
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
