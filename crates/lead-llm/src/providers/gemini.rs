//! Google Gemini provider implementation.
//!
//! Gemini calls messages "contents", uses "model" instead of "assistant",
//! and carries the system prompt separately as `systemInstruction`.

use async_trait::async_trait;
use lead_core::Role;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{error_from_response, non_empty_text};
use crate::catalog::ProviderKind;
use crate::provider::{CompletionProvider, LLMError, Result};
use crate::types::{Completion, CompletionRequest, TokenUsage};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (e.g., for proxies or alternative endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

fn text_content(role: Option<&str>, text: &str) -> GeminiContent {
    GeminiContent {
        role: role.map(str::to_string),
        parts: vec![GeminiPart {
            text: Some(text.to_string()),
        }],
    }
}

pub fn build_request(request: &CompletionRequest) -> GeminiRequest {
    // System messages inside the history are folded into systemInstruction.
    let mut system_parts: Vec<&str> = request.system.iter().map(String::as_str).collect();
    let mut contents = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        match message.role {
            Role::System => system_parts.push(&message.content),
            Role::User => contents.push(text_content(Some("user"), &message.content)),
            Role::Assistant => contents.push(text_content(Some("model"), &message.content)),
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(text_content(None, &system_parts.join("\n\n")))
    };

    let mut generation_config = serde_json::Map::new();
    if let Some(max_tokens) = request.max_output_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(temperature));
    }

    GeminiRequest {
        contents,
        system_instruction,
        generation_config: if generation_config.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(generation_config))
        },
    }
}

pub fn parse_response(data: &str) -> Result<Completion> {
    let response: GeminiResponse = serde_json::from_str(data)?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LLMError::EmptyCompletion)?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let usage = response
        .usage_metadata
        .map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        })
        .unwrap_or_default();

    Ok(Completion {
        text: non_empty_text(text)?,
        usage,
        finish_reason: candidate.finish_reason,
    })
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let body = build_request(&request);
        log::debug!(
            "gemini completion request: model={}, contents={}",
            request.model,
            body.contents.len()
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("gemini", response).await);
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}
