//! Static metadata for every model the product can talk to.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAI,
    Xai,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Xai => "xai",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn estimate(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 * self.input_per_million
            + completion_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub streaming: bool,
    pub function_calling: bool,
    pub vision: bool,
    pub json_mode: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub key: &'static str,
    pub display_name: &'static str,
    pub provider: ProviderKind,
    pub provider_model: &'static str,
    pub pricing: ModelPricing,
    pub capabilities: ModelCapabilities,
    pub context_window: u32,
    pub recommended: bool,
}

impl ModelConfig {
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            key: self.key.to_string(),
            display_name: self.display_name.to_string(),
            provider: self.provider,
            provider_model: self.provider_model.to_string(),
            pricing: self.pricing,
            capabilities: self.capabilities,
            context_window: self.context_window,
            recommended: self.recommended,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub key: String,
    pub display_name: String,
    pub provider: ProviderKind,
    pub provider_model: String,
    pub pricing: ModelPricing,
    pub capabilities: ModelCapabilities,
    pub context_window: u32,
    pub recommended: bool,
}

const FULL: ModelCapabilities = ModelCapabilities {
    streaming: true,
    function_calling: true,
    vision: true,
    json_mode: true,
};

const TEXT_ONLY: ModelCapabilities = ModelCapabilities {
    streaming: true,
    function_calling: true,
    vision: false,
    json_mode: true,
};

const BUILTIN_MODELS: &[ModelConfig] = &[
    ModelConfig {
        key: "gpt-4o",
        display_name: "GPT-4o",
        provider: ProviderKind::OpenAI,
        provider_model: "gpt-4o",
        pricing: ModelPricing {
            input_per_million: 2.5,
            output_per_million: 10.0,
        },
        capabilities: FULL,
        context_window: 128_000,
        recommended: true,
    },
    ModelConfig {
        key: "gpt-4o-mini",
        display_name: "GPT-4o mini",
        provider: ProviderKind::OpenAI,
        provider_model: "gpt-4o-mini",
        pricing: ModelPricing {
            input_per_million: 0.15,
            output_per_million: 0.6,
        },
        capabilities: FULL,
        context_window: 128_000,
        recommended: false,
    },
    ModelConfig {
        key: "grok-3",
        display_name: "Grok 3",
        provider: ProviderKind::Xai,
        provider_model: "grok-3",
        pricing: ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        },
        capabilities: TEXT_ONLY,
        context_window: 131_072,
        recommended: false,
    },
    ModelConfig {
        key: "grok-3-mini",
        display_name: "Grok 3 mini",
        provider: ProviderKind::Xai,
        provider_model: "grok-3-mini",
        pricing: ModelPricing {
            input_per_million: 0.3,
            output_per_million: 0.5,
        },
        capabilities: TEXT_ONLY,
        context_window: 131_072,
        recommended: false,
    },
    ModelConfig {
        key: "gemini-1.5-pro",
        display_name: "Gemini 1.5 Pro",
        provider: ProviderKind::Gemini,
        provider_model: "gemini-1.5-pro",
        pricing: ModelPricing {
            input_per_million: 1.25,
            output_per_million: 5.0,
        },
        capabilities: FULL,
        context_window: 2_000_000,
        recommended: false,
    },
    ModelConfig {
        key: "gemini-2.0-flash",
        display_name: "Gemini 2.0 Flash",
        provider: ProviderKind::Gemini,
        provider_model: "gemini-2.0-flash",
        pricing: ModelPricing {
            input_per_million: 0.1,
            output_per_million: 0.4,
        },
        capabilities: FULL,
        context_window: 1_048_576,
        recommended: true,
    },
];

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelConfig>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_MODELS.to_vec(),
        }
    }

    pub fn new(entries: Vec<ModelConfig>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&ModelConfig> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn entries(&self) -> &[ModelConfig] {
        &self.entries
    }

    pub fn summaries(&self) -> Vec<ModelSummary> {
        self.entries.iter().map(ModelConfig::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_keys_are_unique() {
        let catalog = ModelCatalog::builtin();
        let mut keys: Vec<&str> = catalog.entries().iter().map(|e| e.key).collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn builtin_covers_every_provider() {
        let catalog = ModelCatalog::builtin();
        for provider in [ProviderKind::OpenAI, ProviderKind::Xai, ProviderKind::Gemini] {
            assert!(catalog.entries().iter().any(|e| e.provider == provider));
        }
    }

    #[test]
    fn summaries_are_unfiltered() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.summaries().len(), catalog.entries().len());
    }

    #[test]
    fn unknown_key_is_absent() {
        assert!(ModelCatalog::builtin().get("gpt-99").is_none());
        assert!(ModelCatalog::builtin().get("gpt-4o").is_some());
    }

    #[test]
    fn provider_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAI).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&ProviderKind::Xai).unwrap(), "\"xai\"");
    }

    #[test]
    fn pricing_estimate_scales_per_million() {
        let pricing = ModelPricing {
            input_per_million: 2.0,
            output_per_million: 4.0,
        };
        let cost = pricing.estimate(500_000, 250_000);
        assert!((cost - 2.0).abs() < f64::EPSILON);
    }
}
