//! Metadata header: a `---` delimited YAML mapping holding `feature` and `spec`

use crate::error::{CodecError, FormatError};
use roadmap_model::normalize_block;
use serde_yaml::{Mapping, Value};
use std::fmt::Write;

const MARKER: &str = "---";

/// Parsed (already normalized) metadata fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Metadata {
    pub(crate) feature: String,
    pub(crate) spec: String,
}

/// Split text into the metadata YAML and the remaining body
///
/// Leading blank lines are tolerated, anything else before the opening
/// marker is not.
pub(crate) fn split(text: &str) -> Result<(&str, &str), FormatError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut offset = 0;
    let mut opened_at: Option<usize> = None;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end();

        match opened_at {
            None if content.is_empty() => continue,
            None if content == MARKER => opened_at = Some(offset),
            None => return Err(FormatError::MissingMetadata),
            Some(open) if content == MARKER => return Ok((&text[open..start], &text[offset..])),
            Some(_) => {}
        }
    }

    Err(match opened_at {
        None => FormatError::MissingMetadata,
        Some(_) => FormatError::UnterminatedMetadata,
    })
}

/// Parse the metadata YAML; field order is irrelevant
pub(crate) fn parse(yaml: &str) -> Result<Metadata, FormatError> {
    let value: Value = if yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(yaml).map_err(|e| FormatError::InvalidMetadata(e.to_string()))?
    };

    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => {
            return Err(FormatError::InvalidMetadata(
                "expected a mapping of fields".to_string(),
            ))
        }
    };

    Ok(Metadata {
        feature: scalar_field(&map, "feature")?.trim().to_string(),
        spec: normalize_block(&scalar_field(&map, "spec")?),
    })
}

fn scalar_field(map: &Mapping, name: &'static str) -> Result<String, FormatError> {
    match map.get(name) {
        None | Some(Value::Null) => Err(FormatError::MissingField(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(FormatError::InvalidField(name)),
    }
}

/// Render the header, closing marker and trailing newline included
pub(crate) fn render(feature: &str, spec: &str) -> Result<String, CodecError> {
    let mut out = String::with_capacity(spec.len() + feature.len() + 32);
    out.push_str(MARKER);
    out.push('\n');

    // serde_yaml picks quoting for awkward labels; anything it spreads over
    // several lines would be indented relative to the wrong parent.
    let feature = feature.trim();
    let rendered = serde_yaml::to_string(feature)?;
    out.push_str("feature: ");
    match rendered.trim_end() {
        line if !line.contains('\n') => out.push_str(line),
        _ => push_double_quoted(&mut out, feature),
    }
    out.push('\n');

    let spec = normalize_block(spec);
    if spec.is_empty() {
        out.push_str("spec: ''\n");
    } else if spec.chars().all(fits_literal_block) {
        out.push_str("spec: |2-\n");
        for line in spec.lines() {
            if !line.is_empty() {
                out.push_str("  ");
                out.push_str(line);
            }
            out.push('\n');
        }
    } else {
        out.push_str("spec: ");
        push_double_quoted(&mut out, &spec);
        out.push('\n');
    }

    out.push_str(MARKER);
    out.push('\n');
    Ok(out)
}

/// Characters a literal block carries verbatim: YAML printable, `\n` as the
/// only line break, no byte order mark
fn fits_literal_block(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | ' '..='~'
            | '\u{a0}'..='\u{d7ff}'
            | '\u{e000}'..='\u{fffd}'
            | '\u{10000}'..='\u{10ffff}'
    ) && !matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

/// Single-line double-quoted scalar; every character outside the literal-safe
/// set is escaped
fn push_double_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if fits_literal_block(c) => out.push(c),
            c => {
                let code = u32::from(c);
                let _ = match code {
                    0..=0xff => write!(out, "\\x{code:02X}"),
                    0x100..=0xffff => write!(out, "\\u{code:04X}"),
                    _ => write!(out, "\\U{code:08X}"),
                };
            }
        }
    }
    out.push('"');
}
