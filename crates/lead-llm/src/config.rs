use serde::{Deserialize, Serialize};

use crate::catalog::ProviderKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfigs {
    #[serde(default)]
    pub openai: Option<ProviderSettings>,
    #[serde(default)]
    pub xai: Option<ProviderSettings>,
    #[serde(default)]
    pub gemini: Option<ProviderSettings>,
}

impl ProviderConfigs {
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        match kind {
            ProviderKind::OpenAI => self.openai.as_ref(),
            ProviderKind::Xai => self.xai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: ProviderKind) -> &mut Option<ProviderSettings> {
        match kind {
            ProviderKind::OpenAI => &mut self.openai,
            ProviderKind::Xai => &mut self.xai,
            ProviderKind::Gemini => &mut self.gemini,
        }
    }

    /// Sets the API key for a provider, keeping any configured base URL.
    pub fn set_api_key(&mut self, kind: ProviderKind, api_key: impl Into<String>) {
        self.slot_mut(kind)
            .get_or_insert_with(ProviderSettings::default)
            .api_key = api_key.into();
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.get(kind).is_some_and(ProviderSettings::has_credentials)
    }
}
