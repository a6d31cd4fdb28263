//! Single-shot SEO generation: article bodies and front matter.

use std::sync::Arc;

use lead_core::prompts::{frontmatter_prompt, seo_content_prompt, ContentBrief, FrontmatterBrief};
use lead_llm::{CompletionRequest, ProviderRegistry, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use super::model_key;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub brief: ContentBrief,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontmatterRequest {
    #[serde(flatten)]
    pub brief: FrontmatterBrief,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedText {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    /// Parsed front matter, for front matter requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<JsonValue>,
}

pub struct ContentService {
    registry: Arc<ProviderRegistry>,
    default_model: String,
}

impl ContentService {
    pub fn new(registry: Arc<ProviderRegistry>, default_model: impl Into<String>) -> Self {
        Self {
            registry,
            default_model: default_model.into(),
        }
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GeneratedText> {
        require_title(&request.brief.title)?;
        let prompt = seo_content_prompt(&request.brief);
        self.complete(request.model.as_deref(), prompt).await
    }

    pub async fn frontmatter(&self, request: FrontmatterRequest) -> Result<GeneratedText> {
        require_title(&request.brief.title)?;
        let prompt = frontmatter_prompt(&request.brief);
        let mut generated = self.complete(request.model.as_deref(), prompt).await?;

        let yaml = clean_frontmatter(&generated.content);
        let fields = match serde_yaml::from_str::<YamlValue>(&yaml) {
            Ok(value @ YamlValue::Mapping(_)) => serde_json::to_value(value).map_err(|error| {
                AppError::InvalidOutput(format!("front matter is not JSON-compatible: {}", error))
            })?,
            Ok(_) => {
                return Err(AppError::InvalidOutput(
                    "front matter is not a mapping".to_string(),
                ))
            }
            Err(error) => {
                log::warn!("Model returned unparsable front matter: {}", error);
                return Err(AppError::InvalidOutput(format!(
                    "front matter is not valid YAML: {}",
                    error
                )));
            }
        };

        generated.content = yaml;
        generated.fields = Some(fields);
        Ok(generated)
    }

    async fn complete(&self, requested: Option<&str>, prompt: String) -> Result<GeneratedText> {
        let key = model_key(requested, None, &self.default_model).to_string();
        let resolved = self.registry.resolve(&key)?;

        let completion = resolved
            .provider
            .complete(CompletionRequest::single(resolved.provider_model(), prompt))
            .await
            .map_err(|error| {
                log::error!("Content generation with {} failed: {}", key, error);
                AppError::ProcessingFailed(error)
            })?;

        Ok(GeneratedText {
            content: completion.text,
            model: key,
            usage: completion.usage,
            fields: None,
        })
    }
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidRequest("title must not be empty".to_string()));
    }
    Ok(())
}

/// Strips code fences and `---` delimiters the model may add anyway.
fn clean_frontmatter(text: &str) -> String {
    let mut lines: Vec<&str> = text.trim().lines().collect();
    if lines.first().is_some_and(|line| line.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim() == "```") {
        lines.pop();
    }
    if lines.first().is_some_and(|line| line.trim() == "---") {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| matches!(line.trim(), "---" | "...")) {
        lines.pop();
    }

    let mut yaml = lines.join("\n");
    yaml.push('\n');
    yaml
}
