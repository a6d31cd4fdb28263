//! LLM Providers
//!
//! OpenAI and xAI share the OpenAI-compatible chat completions client;
//! Gemini has its own request shape.

pub mod gemini;
pub mod openai_compat;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAICompatProvider;

use crate::provider::{LLMError, Result};

/// Maps a non-success HTTP response to an [`LLMError`].
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> LLMError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(error) => return LLMError::Http(error),
    };

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return LLMError::Auth(format!(
            "{} authentication failed: {}. Please check your API key.",
            provider, text
        ));
    }

    LLMError::Api(format!("{} API error: HTTP {}: {}", provider, status, text))
}

pub(crate) fn non_empty_text(text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(LLMError::EmptyCompletion)
    } else {
        Ok(text)
    }
}
