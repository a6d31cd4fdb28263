use lead_llm::LLMError;
use thiserror::Error;

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Connection '{0}' not found")]
    UnknownConnection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The model answered with something that cannot be used as a document.
    #[error("Model returned unusable output: {0}")]
    InvalidOutput(String),

    #[error("Git host rejected the request: HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Git host URL: {0}")]
    InvalidUrl(String),

    #[error("Content decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Llm(#[from] LLMError),
}
