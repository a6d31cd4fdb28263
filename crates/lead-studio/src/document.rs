//! Markdown documents with an optional YAML front matter block.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::error::{StudioError, StudioResult};

pub const BODY_FIELD: &str = "body";

/// Keys that describe site plumbing rather than content.
const LOCKED_KEYS: &[&str] = &["layout", "permalink", "id", "uuid"];

const TEXT_THRESHOLD: usize = 120;

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ][0-9:.+\-Z]+)?$").expect("date pattern is valid")
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Number,
    Boolean,
    Date,
    List,
    Object,
}

impl FieldType {
    /// Whether `value` may replace a field of this type.
    pub fn accepts(self, value: &JsonValue) -> bool {
        match self {
            Self::String | Self::Text => value.is_string() || value.is_null(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Date => value
                .as_str()
                .is_some_and(|text| DATE_PATTERN.is_match(text.trim())),
            Self::List => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| !item.is_array() && !item.is_object())),
            Self::Object => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditableField {
    /// Dot-joined key path, or `body` for the document body.
    pub path: String,
    pub field_type: FieldType,
    pub value: JsonValue,
    pub editable: bool,
}

/// A parsed content file. Rendering an unmodified document reproduces the
/// original text byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    frontmatter: Option<FrontMatter>,
    body: String,
}

#[derive(Debug, Clone, PartialEq)]
struct FrontMatter {
    opening: String,
    raw: String,
    closing: String,
}

impl ContentDocument {
    pub fn parse(raw: &str) -> StudioResult<Self> {
        let mut lines = raw.split_inclusive('\n');
        let opening = match lines.next() {
            Some(line) if line.trim_end() == "---" => line,
            _ => {
                return Ok(Self {
                    frontmatter: None,
                    body: raw.to_string(),
                })
            }
        };

        let start = opening.len();
        let mut offset = start;
        for line in lines {
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                let document = Self {
                    frontmatter: Some(FrontMatter {
                        opening: opening.to_string(),
                        raw: raw[start..offset].to_string(),
                        closing: line.to_string(),
                    }),
                    body: raw[offset + line.len()..].to_string(),
                };
                document.yaml()?;
                return Ok(document);
            }
            offset += line.len();
        }

        Err(StudioError::InvalidDocument(
            "front matter block is not terminated".to_string(),
        ))
    }

    pub fn render(&self) -> String {
        match &self.frontmatter {
            Some(frontmatter) => format!(
                "{}{}{}{}",
                frontmatter.opening, frontmatter.raw, frontmatter.closing, self.body
            ),
            None => self.body.clone(),
        }
    }

    pub fn raw_frontmatter(&self) -> &str {
        self.frontmatter
            .as_ref()
            .map(|frontmatter| frontmatter.raw.as_str())
            .unwrap_or_default()
    }

    pub fn has_frontmatter(&self) -> bool {
        self.frontmatter.is_some()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: String) {
        self.body = body;
    }

    pub(crate) fn set_raw_frontmatter(&mut self, raw: String) {
        match &mut self.frontmatter {
            Some(frontmatter) => frontmatter.raw = raw,
            None => {
                self.frontmatter = Some(FrontMatter {
                    opening: "---\n".to_string(),
                    raw,
                    closing: "---\n".to_string(),
                })
            }
        }
    }

    /// The front matter as a YAML mapping. A missing or empty block is an
    /// empty mapping.
    pub fn yaml(&self) -> StudioResult<Mapping> {
        let raw = self.raw_frontmatter();
        if raw.trim().is_empty() {
            return Ok(Mapping::new());
        }
        match serde_yaml::from_str::<YamlValue>(raw)? {
            YamlValue::Mapping(mapping) => Ok(mapping),
            YamlValue::Null => Ok(Mapping::new()),
            _ => Err(StudioError::InvalidDocument(
                "front matter must be a mapping".to_string(),
            )),
        }
    }

    pub fn fields(&self) -> StudioResult<Vec<EditableField>> {
        let mut fields = Vec::new();
        collect_fields(&self.yaml()?, "", &mut fields)?;
        fields.push(EditableField {
            path: BODY_FIELD.to_string(),
            field_type: FieldType::Text,
            value: JsonValue::String(self.body.clone()),
            editable: true,
        });
        Ok(fields)
    }

    pub fn field(&self, path: &str) -> StudioResult<Option<EditableField>> {
        Ok(self.fields()?.into_iter().find(|field| field.path == path))
    }
}

fn collect_fields(
    mapping: &Mapping,
    prefix: &str,
    fields: &mut Vec<EditableField>,
) -> StudioResult<()> {
    for (key, value) in mapping {
        let Some(key) = key_name(key) else {
            continue;
        };
        // The top-level `body` path addresses the document body.
        if prefix.is_empty() && key == BODY_FIELD {
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        if let YamlValue::Mapping(nested) = value {
            if !nested.is_empty() {
                collect_fields(nested, &path, fields)?;
                continue;
            }
        }

        let field_type = classify(value);
        let locked = key.starts_with('_') || LOCKED_KEYS.contains(&key.as_str());
        let editable = !locked
            && match value {
                YamlValue::Sequence(items) => items.iter().all(is_scalar),
                YamlValue::Mapping(_) | YamlValue::Tagged(_) => false,
                _ => true,
            };

        fields.push(EditableField {
            path,
            field_type,
            value: serde_json::to_value(value)?,
            editable,
        });
    }
    Ok(())
}

pub(crate) fn key_name(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(key) => Some(key.clone()),
        YamlValue::Number(number) => Some(number.to_string()),
        YamlValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn is_scalar(value: &YamlValue) -> bool {
    matches!(
        value,
        YamlValue::String(_) | YamlValue::Number(_) | YamlValue::Bool(_) | YamlValue::Null
    )
}

fn classify(value: &YamlValue) -> FieldType {
    match value {
        YamlValue::String(text) if DATE_PATTERN.is_match(text) => FieldType::Date,
        YamlValue::String(text) if text.contains('\n') || text.len() > TEXT_THRESHOLD => {
            FieldType::Text
        }
        YamlValue::String(_) | YamlValue::Null => FieldType::String,
        YamlValue::Number(_) => FieldType::Number,
        YamlValue::Bool(_) => FieldType::Boolean,
        YamlValue::Sequence(_) => FieldType::List,
        YamlValue::Mapping(_) | YamlValue::Tagged(_) => FieldType::Object,
    }
}

/// A file fetched from the Git host together with its editable fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentFile {
    pub path: String,
    pub sha: String,
    pub raw_frontmatter: String,
    pub body: String,
    pub fields: Vec<EditableField>,
}

impl ContentFile {
    pub fn from_document(
        path: impl Into<String>,
        sha: impl Into<String>,
        document: &ContentDocument,
    ) -> StudioResult<Self> {
        Ok(Self {
            path: path.into(),
            sha: sha.into(),
            raw_frontmatter: document.raw_frontmatter().to_string(),
            body: document.body().to_string(),
            fields: document.fields()?,
        })
    }
}
