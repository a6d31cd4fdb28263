use actix_web::{web, HttpResponse};
use lead_llm::{CompletionRequest, ModelSummary, TokenUsage};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_TEST_MESSAGE: &str = "Reply with a short greeting.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    #[serde(flatten)]
    summary: ModelSummary,
    /// Whether the model's provider has a credential configured.
    available: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelListResponse {
    models: Vec<ModelEntry>,
    default_model: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelTestRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelTestResponse {
    reply: String,
    model: String,
    provider_model: String,
    usage: TokenUsage,
}

pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    let models = state
        .registry
        .catalog()
        .entries()
        .iter()
        .map(|config| ModelEntry {
            summary: config.summary(),
            available: state.registry.has_provider(config.provider),
        })
        .collect();

    HttpResponse::Ok().json(ModelListResponse {
        models,
        default_model: state.default_model.clone(),
    })
}

/// Sends one prompt to the model behind `key`. An unknown key is rejected
/// before any provider is contacted.
pub async fn test(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: Option<web::Json<ModelTestRequest>>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();
    let resolved = state.registry.resolve(&key)?;

    let message = request
        .and_then(|request| request.into_inner().message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TEST_MESSAGE.to_string());

    let completion = resolved
        .provider
        .complete(CompletionRequest::single(resolved.provider_model(), message))
        .await
        .map_err(|error| {
            log::error!("Model test for {} failed: {}", key, error);
            AppError::ProcessingFailed(error)
        })?;

    Ok(HttpResponse::Ok().json(ModelTestResponse {
        reply: completion.text,
        provider_model: resolved.provider_model().to_string(),
        model: key,
        usage: completion.usage,
    }))
}
