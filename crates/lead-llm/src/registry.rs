//! Maps logical model keys to a provider client and provider-side model name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{ModelCatalog, ModelConfig, ProviderKind};
use crate::config::ProviderConfigs;
use crate::provider::{CompletionProvider, LLMError, Result};
use crate::providers::{GeminiProvider, OpenAICompatProvider};

/// A model key resolved to the client that serves it.
#[derive(Clone)]
pub struct ResolvedModel {
    pub config: ModelConfig,
    pub provider: Arc<dyn CompletionProvider>,
}

impl ResolvedModel {
    pub fn provider_model(&self) -> &'static str {
        self.config.provider_model
    }
}

impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("key", &self.config.key)
            .field("provider", &self.config.provider)
            .field("provider_model", &self.config.provider_model)
            .finish()
    }
}

pub struct ProviderRegistry {
    catalog: ModelCatalog,
    providers: HashMap<ProviderKind, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self {
            catalog,
            providers: HashMap::new(),
        }
    }

    /// Creates one client per provider that has credentials.
    pub fn from_config(catalog: ModelCatalog, configs: &ProviderConfigs) -> Self {
        let mut registry = Self::new(catalog);

        if let Some(settings) = configs.openai.as_ref().filter(|s| s.has_credentials()) {
            let mut provider = OpenAICompatProvider::openai(&settings.api_key);
            if let Some(base_url) = settings.base_url() {
                provider = provider.with_base_url(base_url);
            }
            registry = registry.with_provider(ProviderKind::OpenAI, Arc::new(provider));
        }

        if let Some(settings) = configs.xai.as_ref().filter(|s| s.has_credentials()) {
            let mut provider = OpenAICompatProvider::xai(&settings.api_key);
            if let Some(base_url) = settings.base_url() {
                provider = provider.with_base_url(base_url);
            }
            registry = registry.with_provider(ProviderKind::Xai, Arc::new(provider));
        }

        if let Some(settings) = configs.gemini.as_ref().filter(|s| s.has_credentials()) {
            let mut provider = GeminiProvider::new(&settings.api_key);
            if let Some(base_url) = settings.base_url() {
                provider = provider.with_base_url(base_url);
            }
            registry = registry.with_provider(ProviderKind::Gemini, Arc::new(provider));
        }

        let configured: Vec<&str> = registry.providers.keys().map(|kind| kind.as_str()).collect();
        log::info!("Configured LLM providers: {:?}", configured);
        registry
    }

    pub fn with_provider(
        mut self,
        kind: ProviderKind,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Looks up `key` in the catalog. Never falls back to another model.
    pub fn resolve(&self, key: &str) -> Result<ResolvedModel> {
        let config = self
            .catalog
            .get(key)
            .ok_or_else(|| LLMError::UnsupportedModel(key.to_string()))?;

        let provider = self.providers.get(&config.provider).cloned().ok_or_else(|| {
            LLMError::ProviderUnavailable {
                provider: config.provider,
                model: key.to_string(),
            }
        })?;

        Ok(ResolvedModel {
            config: config.clone(),
            provider,
        })
    }
}
