//! Field-level edits to a [`ContentDocument`].
//!
//! Scalar front matter values are replaced on their own line so the rest
//! of the block keeps its formatting and comments. Anything that cannot be
//! located that way (block scalars, nested lists, flow mappings) falls back
//! to re-serializing the whole front matter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::document::{key_name, ContentDocument, BODY_FIELD};
use crate::error::{StudioError, StudioResult};

static KEY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<indent> *)(?P<key>"[^"]*"|'[^']*'|[^\s:#'"\-][^:#]*?)\s*:(?:\s+|$)"#)
        .expect("key line pattern is valid")
});

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    #[default]
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    pub path: String,
    pub value: JsonValue,
    #[serde(default)]
    pub operation: PatchOperation,
}

impl FieldPatch {
    pub fn replace(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
            operation: PatchOperation::Replace,
        }
    }
}

/// Applies `patches` in order and returns the edited document.
pub fn apply_patches(
    document: &ContentDocument,
    patches: &[FieldPatch],
) -> StudioResult<ContentDocument> {
    let mut document = document.clone();
    for patch in patches {
        apply_patch(&mut document, patch)?;
    }
    Ok(document)
}

fn apply_patch(document: &mut ContentDocument, patch: &FieldPatch) -> StudioResult<()> {
    if patch.path == BODY_FIELD {
        let body = patch.value.as_str().ok_or_else(|| {
            StudioError::InvalidPatch("body must be replaced with a string".to_string())
        })?;
        document.set_body(body.to_string());
        return Ok(());
    }

    let field = document
        .field(&patch.path)?
        .ok_or_else(|| StudioError::InvalidPatch(format!("unknown field '{}'", patch.path)))?;
    if !field.editable {
        return Err(StudioError::InvalidPatch(format!(
            "field '{}' is not editable",
            patch.path
        )));
    }
    if !field.field_type.accepts(&patch.value) {
        return Err(StudioError::InvalidPatch(format!(
            "value for '{}' does not match its {:?} type",
            patch.path, field.field_type
        )));
    }

    let segments: Vec<&str> = patch.path.split('.').collect();
    let raw = document.raw_frontmatter().to_string();

    let updated = match replace_in_place(&raw, &segments, &patch.value) {
        Some(updated) => updated,
        None => {
            log::debug!(
                "Re-serializing front matter to apply patch on '{}'",
                patch.path
            );
            reserialize(document.yaml()?, &segments, &patch.value)?
        }
    };

    document.set_raw_frontmatter(updated);
    document.yaml()?;
    Ok(())
}

fn replace_in_place(raw: &str, segments: &[&str], value: &JsonValue) -> Option<String> {
    let lines: Vec<&str> = raw.split_inclusive('\n').collect();
    let (index, value_start) = locate_key_line(&lines, segments)?;

    let line = lines[index];
    let content = line.trim_end_matches(['\n', '\r']);
    let newline = &line[content.len()..];
    let current = &content[value_start..];
    let (current_value, suffix) = split_comment(current);

    let current_value = current_value.trim();
    if current_value.is_empty()
        || current_value.starts_with(['|', '>', '&', '*', '!', '{'])
        || has_continuation(&lines, index)
    {
        return None;
    }
    if current_value.starts_with('[') && !current_value.ends_with(']') {
        return None;
    }

    let rendered = render_inline(value, current_value.starts_with('['))?;
    let mut replaced = String::with_capacity(raw.len() + rendered.len());
    for (position, original) in lines.iter().enumerate() {
        if position == index {
            replaced.push_str(&content[..value_start]);
            replaced.push_str(&rendered);
            if !suffix.is_empty() {
                replaced.push(' ');
                replaced.push_str(suffix);
            }
            replaced.push_str(newline);
        } else {
            replaced.push_str(original);
        }
    }
    Some(replaced)
}

/// Finds the line holding `segments` in a block mapping. Returns the line
/// index and the byte offset where its value starts.
fn locate_key_line(lines: &[&str], segments: &[&str]) -> Option<(usize, usize)> {
    let mut stack: Vec<(usize, String)> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = content.len() - trimmed.len();
        if trimmed.starts_with("- ") || trimmed == "-" {
            continue;
        }

        let Some(captures) = KEY_LINE.captures(content) else {
            continue;
        };
        let key = unquote(captures.name("key")?.as_str().trim());
        let value_start = captures.get(0)?.end();

        while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
            stack.pop();
        }
        stack.push((indent, key));

        if stack.len() == segments.len()
            && stack
                .iter()
                .zip(segments.iter())
                .all(|((_, key), segment)| key == segment)
        {
            return Some((index, value_start));
        }
    }
    None
}

fn unquote(key: &str) -> String {
    let quoted = (key.starts_with('"') && key.ends_with('"'))
        || (key.starts_with('\'') && key.ends_with('\''));
    if quoted && key.len() >= 2 {
        key[1..key.len() - 1].to_string()
    } else {
        key.to_string()
    }
}

/// Splits a trailing `# comment` off an unquoted value.
fn split_comment(value: &str) -> (&str, &str) {
    let trimmed = value.trim_start();
    if trimmed.starts_with('"') || trimmed.starts_with('\'') {
        let quote = trimmed.chars().next().unwrap_or('"');
        if let Some(end) = trimmed[1..].find(quote) {
            let split = value.len() - trimmed.len() + end + 2;
            let rest = value[split..].trim();
            if rest.starts_with('#') {
                return (&value[..split], rest);
            }
        }
        return (value, "");
    }
    match value.find(" #") {
        Some(position) => (&value[..position], value[position..].trim()),
        None => (value, ""),
    }
}

/// A deeper-indented, non-key line after a scalar means a multi-line plain
/// scalar that cannot be swapped in place.
fn has_continuation(lines: &[&str], index: usize) -> bool {
    let indent_of = |line: &str| line.len() - line.trim_start().len();
    let current_indent = indent_of(lines[index]);
    lines
        .iter()
        .skip(index + 1)
        .map(|line| line.trim_end_matches(['\n', '\r']))
        .find(|line| !line.trim().is_empty())
        .is_some_and(|next| indent_of(next) > current_indent)
}

/// Renders `value` as a single-line YAML scalar, or a flow sequence when
/// `flow_list` is set. `None` when it would need more than one line.
fn render_inline(value: &JsonValue, flow_list: bool) -> Option<String> {
    match value {
        JsonValue::Array(items) => {
            if !flow_list {
                return None;
            }
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                if item.is_array() || item.is_object() {
                    return None;
                }
                let scalar = render_scalar(item)?;
                if scalar.contains([',', '[', ']', '{', '}']) {
                    return None;
                }
                rendered.push(scalar);
            }
            Some(format!("[{}]", rendered.join(", ")))
        }
        JsonValue::Object(_) => None,
        scalar => render_scalar(scalar),
    }
}

fn render_scalar(value: &JsonValue) -> Option<String> {
    let rendered = serde_yaml::to_string(value).ok()?;
    let rendered = rendered.strip_prefix("---\n").unwrap_or(&rendered);
    let rendered = rendered.trim_end_matches('\n');
    if rendered.contains('\n') {
        None
    } else {
        Some(rendered.to_string())
    }
}

fn reserialize(mut mapping: Mapping, segments: &[&str], value: &JsonValue) -> StudioResult<String> {
    let new_value: YamlValue = serde_yaml::to_value(value)?;
    set_path(&mut mapping, segments, new_value)?;
    let rendered = serde_yaml::to_string(&YamlValue::Mapping(mapping))?;
    Ok(rendered
        .strip_prefix("---\n")
        .map(str::to_string)
        .unwrap_or(rendered))
}

fn set_path(mapping: &mut Mapping, segments: &[&str], value: YamlValue) -> StudioResult<()> {
    let (head, rest) = segments
        .split_first()
        .ok_or_else(|| StudioError::InvalidPatch("empty field path".to_string()))?;

    let slot = mapping
        .iter_mut()
        .find(|(key, _)| key_name(key).as_deref() == Some(*head))
        .map(|(_, slot)| slot)
        .ok_or_else(|| StudioError::InvalidPatch(format!("unknown field '{}'", head)))?;

    if rest.is_empty() {
        *slot = value;
        return Ok(());
    }

    match slot {
        YamlValue::Mapping(nested) => set_path(nested, rest, value),
        _ => Err(StudioError::InvalidPatch(format!(
            "'{}' is not a mapping",
            head
        ))),
    }
}
