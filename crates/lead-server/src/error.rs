use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use lead_core::StoreError;
use lead_llm::LLMError;
use lead_studio::StudioError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

const PROCESSING_FAILED: &str = "failed to process message";
const UNUSABLE_OUTPUT: &str = "model returned unusable output";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// The provider call failed. The cause is logged, never returned.
    #[error("failed to process message")]
    ProcessingFailed(#[source] LLMError),

    #[error(transparent)]
    Model(LLMError),

    #[error("Model returned unusable output: {0}")]
    InvalidOutput(String),

    #[error(transparent)]
    Studio(#[from] StudioError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<LLMError> for AppError {
    fn from(error: LLMError) -> Self {
        if error.is_resolution_error() {
            AppError::Model(error)
        } else {
            AppError::ProcessingFailed(error)
        }
    }
}

#[derive(Serialize)]
struct JsonError {
    message: String,
    r#type: String,
}

#[derive(Serialize)]
struct JsonErrorWrapper {
    error: JsonError,
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self.status_code().as_u16() {
            400 => "invalid_request_error",
            404 => "not_found_error",
            502 => "upstream_error",
            _ => "api_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ProcessingFailed(_) => PROCESSING_FAILED.to_string(),
            AppError::Studio(StudioError::Llm(llm)) if !llm.is_resolution_error() => {
                PROCESSING_FAILED.to_string()
            }
            AppError::InvalidOutput(_) | AppError::Studio(StudioError::InvalidOutput(_)) => {
                UNUSABLE_OUTPUT.to_string()
            }
            AppError::Storage(_) => "Storage error".to_string(),
            _ => self.to_string(),
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::ProcessingFailed(source) => format!("{}: {}", PROCESSING_FAILED, source),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::Model(_) => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ProcessingFailed(_) | AppError::InvalidOutput(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Studio(error) => match error {
                StudioError::UnknownConnection(_) | StudioError::NotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                StudioError::InvalidPatch(_)
                | StudioError::InvalidDocument(_)
                | StudioError::Yaml(_) => StatusCode::BAD_REQUEST,
                StudioError::Llm(llm) if llm.is_resolution_error() => StatusCode::BAD_REQUEST,
                StudioError::Llm(_)
                | StudioError::InvalidOutput(_)
                | StudioError::Upstream { .. }
                | StudioError::Http(_)
                | StudioError::Decode(_) => StatusCode::BAD_GATEWAY,
                StudioError::Json(_) | StudioError::InvalidUrl(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("Request failed with {}: {}", status_code, self.detail());
        }

        HttpResponse::build(status_code).json(JsonErrorWrapper {
            error: JsonError {
                message: self.public_message(),
                r#type: self.error_type().to_string(),
            },
        })
    }
}
