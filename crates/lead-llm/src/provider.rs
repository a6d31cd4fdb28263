use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::ProviderKind;
use crate::types::{Completion, CompletionRequest};

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Provider {provider} is not configured for model {model}")]
    ProviderUnavailable {
        provider: ProviderKind,
        model: String,
    },

    #[error("Provider returned an empty completion")]
    EmptyCompletion,
}

impl LLMError {
    /// Errors raised before any outbound request was attempted.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            LLMError::UnsupportedModel(_) | LLMError::ProviderUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// A single-turn completion endpoint of an external model provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Sends the whole prompt and waits for one text completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;
}
