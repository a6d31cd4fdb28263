pub mod catalog;
pub mod config;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod types;

pub use catalog::{ModelCapabilities, ModelCatalog, ModelConfig, ModelPricing, ModelSummary, ProviderKind};
pub use config::{ProviderConfigs, ProviderSettings};
pub use provider::{CompletionProvider, LLMError, Result};
pub use providers::{GeminiProvider, OpenAICompatProvider};
pub use registry::{ProviderRegistry, ResolvedModel};
pub use types::{Completion, CompletionRequest, TokenUsage};
