//! OpenAI-compatible chat completions client.
//!
//! xAI exposes the same `/chat/completions` shape as OpenAI, so one client
//! serves both with a different base URL.

use async_trait::async_trait;
use lead_core::Role;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error_from_response, non_empty_text};
use crate::catalog::ProviderKind;
use crate::provider::{CompletionProvider, LLMError, Result};
use crate::types::{Completion, CompletionRequest, TokenUsage};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";

pub struct OpenAICompatProvider {
    client: Client,
    kind: ProviderKind,
    api_key: String,
    base_url: String,
}

impl OpenAICompatProvider {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::with_kind(ProviderKind::OpenAI, api_key, OPENAI_BASE_URL)
    }

    pub fn xai(api_key: impl Into<String>) -> Self {
        Self::with_kind(ProviderKind::Xai, api_key, XAI_BASE_URL)
    }

    fn with_kind(kind: ProviderKind, api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            kind,
            api_key: api_key.into(),
            base_url: base_url.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

/// Builds a non-streaming chat completions body. The system prompt, when
/// present, becomes the first message.
pub fn build_request_body(request: &CompletionRequest) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    for message in &request.messages {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        messages.push(json!({ "role": role, "content": message.content }));
    }

    let mut body = json!({
        "model": request.model,
        "messages": messages,
        "stream": false,
    });

    if let Some(max_tokens) = request.max_output_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }

    body
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

pub fn parse_response(data: &str) -> Result<Completion> {
    let response: ChatCompletionResponse = serde_json::from_str(data)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(LLMError::EmptyCompletion)?;
    let text = non_empty_text(choice.message.content.unwrap_or_default())?;
    let usage = response
        .usage
        .map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        })
        .unwrap_or_default();

    Ok(Completion {
        text,
        usage,
        finish_reason: choice.finish_reason,
    })
}

#[async_trait]
impl CompletionProvider for OpenAICompatProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let body = build_request_body(&request);
        log::debug!(
            "{} completion request: model={}, messages={}",
            self.kind,
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(self.kind.as_str(), response).await);
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lead_core::Message;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_base_urls() {
        assert_eq!(OpenAICompatProvider::openai("k").base_url, OPENAI_BASE_URL);
        assert_eq!(OpenAICompatProvider::xai("k").base_url, XAI_BASE_URL);
        assert_eq!(OpenAICompatProvider::xai("k").kind(), ProviderKind::Xai);
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let provider = OpenAICompatProvider::openai("k").with_base_url("http://localhost:9000/v1/");
        assert_eq!(provider.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn test_request_body_puts_system_first() {
        let request = CompletionRequest::new(
            "gpt-4o",
            vec![Message::user("Hi"), Message::assistant("Hello"), Message::user("More")],
        )
        .with_system("Be brief")
        .with_max_output_tokens(256);

        let body = build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 256);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "More");
    }

    #[test]
    fn test_request_body_without_optional_fields() {
        let body = build_request_body(&CompletionRequest::single("gpt-4o-mini", "Hello"));
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_response_with_usage() {
        let data = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"Hello there"},"finish_reason":"stop"}],"usage":{"prompt_tokens":12,"completion_tokens":3,"total_tokens":15}}"#;
        let completion = parse_response(data).unwrap();
        assert_eq!(completion.text, "Hello there");
        assert_eq!(completion.usage.total_tokens, 15);
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let result = parse_response(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(LLMError::EmptyCompletion)));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(parse_response("{not json"), Err(LLMError::Json(_))));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({ "model": "grok-3" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "pong" }, "finish_reason": "stop" }],
                "usage": { "prompt_tokens": 4, "completion_tokens": 1, "total_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAICompatProvider::xai("sk-test").with_base_url(server.uri());
        let completion = provider
            .complete(CompletionRequest::single("grok-3", "ping"))
            .await
            .unwrap();

        assert_eq!(completion.text, "pong");
        assert_eq!(completion.usage.prompt_tokens, 4);
    }

    #[tokio::test]
    async fn test_complete_maps_unauthorized_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider = OpenAICompatProvider::openai("wrong").with_base_url(server.uri());
        let result = provider
            .complete(CompletionRequest::single("gpt-4o", "ping"))
            .await;

        assert!(matches!(result, Err(LLMError::Auth(_))));
    }

    #[tokio::test]
    async fn test_complete_maps_rate_limit_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let provider = OpenAICompatProvider::openai("sk").with_base_url(server.uri());
        let error = provider
            .complete(CompletionRequest::single("gpt-4o", "ping"))
            .await
            .unwrap_err();

        match error {
            LLMError::Api(message) => assert!(message.contains("429")),
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
