//! One conversation exchange: load or start a session, ask the model, keep
//! both turns.

use std::sync::Arc;

use lead_core::prompts::chat_turn;
use lead_core::{
    Exchange, Session, SessionContext, SessionFilter, SessionStore, SessionSummary, SessionType,
    SuggestionExtractor,
};
use lead_llm::{CompletionRequest, ProviderRegistry, TokenUsage};
use serde::{Deserialize, Serialize};

use super::model_key;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub message: String,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    /// Agent or content item the conversation belongs to.
    #[serde(default, alias = "content_id")]
    pub content_id: Option<String>,
    #[serde(default, alias = "session_type")]
    pub session_type: Option<SessionType>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub context: Option<SessionContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOutcome {
    pub session_id: String,
    pub reply: String,
    pub suggestions: Vec<String>,
    pub message_count: u32,
    pub model: String,
    pub usage: TokenUsage,
}

pub struct ConversationService {
    store: Arc<dyn SessionStore>,
    registry: Arc<ProviderRegistry>,
    extractor: Arc<dyn SuggestionExtractor>,
    default_model: String,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<ProviderRegistry>,
        extractor: Arc<dyn SuggestionExtractor>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            extractor,
            default_model: default_model.into(),
        }
    }

    pub async fn exchange(&self, request: ExchangeRequest) -> Result<ExchangeOutcome> {
        let text = request.message.trim();
        if text.is_empty() {
            return Err(AppError::InvalidRequest("message must not be empty".to_string()));
        }

        let mut session = self.open_session(&request).await?;
        session.context = std::mem::take(&mut session.context).merged(request.context.clone());

        let key = model_key(
            request.model.as_deref(),
            session.model.as_deref(),
            &self.default_model,
        )
        .to_string();
        let resolved = self.registry.resolve(&key)?;

        let prompt = chat_turn(
            session.session_type,
            &session.context,
            session.messages(),
            text,
        );
        log::debug!(
            "[{}] Sending {} message(s) to {} ({})",
            session.id,
            prompt.messages.len(),
            key,
            resolved.provider_model()
        );

        let completion = resolved
            .provider
            .complete(CompletionRequest::from_prompt(
                resolved.provider_model(),
                prompt,
            ))
            .await
            .map_err(|error| {
                log::error!("[{}] Completion with {} failed: {}", session.id, key, error);
                AppError::ProcessingFailed(error)
            })?;

        let suggestions = self.extractor.extract(&completion.text);
        if request
            .model
            .as_deref()
            .is_some_and(|model| !model.trim().is_empty())
        {
            session.model = Some(key.clone());
        }

        let exchange = Exchange::new(text, completion.text.clone());
        let message_count = self.store.append_exchange(&session, &exchange).await?;
        log::info!(
            "[{}] Exchange stored, session now holds {} message(s)",
            session.id,
            message_count
        );

        Ok(ExchangeOutcome {
            session_id: session.id,
            reply: completion.text,
            suggestions,
            message_count,
            model: key,
            usage: completion.usage,
        })
    }

    async fn open_session(&self, request: &ExchangeRequest) -> Result<Session> {
        if let Some(session_id) = request.session_id.as_deref() {
            return self
                .store
                .load_session(session_id)
                .await?
                .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()));
        }

        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|user_id| !user_id.is_empty())
            .ok_or_else(|| {
                AppError::InvalidRequest("either sessionId or userId is required".to_string())
            })?;

        let mut session = Session::new(user_id, request.session_type.unwrap_or_default());
        if let Some(content_id) = request.content_id.as_deref() {
            session = session.with_content_id(content_id);
        }
        log::debug!("[{}] Starting {} session", session.id, session.session_type.as_str());
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.store
            .load_session(session_id)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }

    pub async fn list_sessions(&self, filter: SessionFilter) -> Result<Vec<SessionSummary>> {
        Ok(self.store.list_sessions(filter).await?)
    }
}
