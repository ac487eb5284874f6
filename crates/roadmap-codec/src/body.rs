//! Task block: the fenced `yaml` code block carrying the roadmap tree
//!
//! The block is located with pulldown-cmark so prose, headings and other
//! code blocks around it are ignored. Its content is read into string-typed
//! records first, then converted field by field so each defect maps to its
//! own [`FormatError`].

use crate::error::{CodecError, FormatError};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use roadmap_model::{Action, ActionNumber, Feature, FeatureNumber, Roadmap, Status};
use serde::{Deserialize, Serialize};

/// Info string marking the task block
pub const TASK_BLOCK_LANG: &str = "yaml";

#[derive(Debug, Deserialize)]
struct RawTaskBlock {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    number: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    number: String,
    #[serde(default)]
    description: String,
    status: String,
}

#[derive(Serialize)]
struct TaskBlockRef<'a> {
    features: &'a [Feature],
}

/// Raw content of the first `yaml` fenced block in `body`
pub(crate) fn extract(body: &str) -> Result<String, FormatError> {
    let mut capture: Option<(std::ops::Range<usize>, String)> = None;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if capture.is_none() && is_task_info(&info) =>
            {
                capture = Some((range, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, content)) = capture.as_mut() {
                    content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((range, content)) = capture.take() {
                    if !fence_closed(&body[range]) {
                        return Err(FormatError::UnterminatedTaskBlock);
                    }
                    return Ok(content);
                }
            }
            _ => {}
        }
    }

    Err(FormatError::MissingTaskBlock)
}

fn is_task_info(info: &str) -> bool {
    info.split_whitespace().next() == Some(TASK_BLOCK_LANG)
}

/// pulldown-cmark closes an unterminated fence at end of input, so check
/// the raw source for a real closing fence.
fn fence_closed(block: &str) -> bool {
    let mut lines = block.trim_end().lines();
    let Some(open) = lines.next().map(str::trim_start) else {
        return false;
    };
    let Some(fence_char) = open.chars().next() else {
        return false;
    };
    let fence_len = open.chars().take_while(|&c| c == fence_char).count();

    lines.last().map(str::trim).is_some_and(|close| {
        close.len() >= fence_len && close.chars().all(|c| c == fence_char)
    })
}

/// Parse block content into a typed tree (not yet validated)
pub(crate) fn parse(content: &str) -> Result<Roadmap, FormatError> {
    if content.trim().is_empty() {
        return Err(FormatError::EmptyTaskBlock);
    }

    let raw: RawTaskBlock = serde_yaml::from_str(content)
        .map_err(|e| FormatError::InvalidTaskBlock(e.to_string()))?;
    if raw.features.is_empty() {
        return Err(FormatError::EmptyTaskBlock);
    }

    let features = raw
        .features
        .into_iter()
        .map(RawFeature::into_feature)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Roadmap { features })
}

impl RawFeature {
    fn into_feature(self) -> Result<Feature, FormatError> {
        let number = FeatureNumber::parse(&self.number).map_err(FormatError::InvalidIdentifier)?;

        if self.description.trim().is_empty() {
            return Err(FormatError::EmptyFeatureDescription(self.number));
        }
        if self.actions.is_empty() {
            return Err(FormatError::FeatureWithoutActions(self.number));
        }

        let actions = self
            .actions
            .into_iter()
            .map(|raw| raw.into_action(&number))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Feature {
            number,
            title: self.title,
            description: self.description,
            actions,
        })
    }
}

impl RawAction {
    fn into_action(self, feature: &FeatureNumber) -> Result<Action, FormatError> {
        let number = ActionNumber::parse(&self.number).map_err(FormatError::InvalidIdentifier)?;
        if !number.belongs_to(feature) {
            return Err(FormatError::ActionPrefixMismatch {
                feature: feature.to_string(),
                action: self.number,
            });
        }

        let status = self
            .status
            .parse::<Status>()
            .map_err(|_| FormatError::UnknownStatus {
                action: self.number.clone(),
                status: self.status.clone(),
            })?;

        Ok(Action {
            number,
            description: self.description,
            status,
        })
    }
}

/// Render the fenced block, trailing newline included
pub(crate) fn render(roadmap: &Roadmap) -> Result<String, CodecError> {
    let yaml = serde_yaml::to_string(&TaskBlockRef {
        features: &roadmap.features,
    })?;
    let fence = "`".repeat(longest_backtick_run(&yaml).max(2) + 1);
    Ok(format!("{fence}{TASK_BLOCK_LANG}\n{yaml}{fence}\n"))
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}
