//! Server configuration: an optional TOML file overlaid with environment
//! variables.

use std::path::{Path, PathBuf};

use lead_llm::{ModelCatalog, ProviderConfigs, ProviderKind};
use lead_studio::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "leadchat.toml";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Default model '{0}' is not in the model catalog")]
    UnknownDefaultModel(String),

    #[error("Default model '{model}' needs a {provider} API key")]
    MissingCredential {
        model: String,
        provider: ProviderKind,
    },

    #[error("Duplicate studio connection id '{0}'")]
    DuplicateConnection(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GitHubSettings {
    #[serde(default)]
    pub token: Option<String>,
    /// REST API base, for GitHub Enterprise.
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database: PathBuf,
    pub default_model: String,
    pub providers: ProviderConfigs,
    pub github: GitHubSettings,
    pub connections: Vec<Connection>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database: default_database_path(),
            default_model: DEFAULT_MODEL.to_string(),
            providers: ProviderConfigs::default(),
            github: GitHubSettings::default(),
            connections: Vec::new(),
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".leadchat")
        .join("leadchat.db")
}

impl ServerConfig {
    /// Reads `path` when given, otherwise `leadchat.toml` in the working
    /// directory if it exists, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlays values from `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.providers.set_api_key(ProviderKind::OpenAI, key);
        }
        if let Some(key) = get("XAI_API_KEY") {
            self.providers.set_api_key(ProviderKind::Xai, key);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.providers.set_api_key(ProviderKind::Gemini, key);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(database) = get("LEADCHAT_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(model) = get("LEADCHAT_DEFAULT_MODEL") {
            self.default_model = model;
        }
    }

    pub fn validate(&self, catalog: &ModelCatalog) -> Result<(), ConfigError> {
        let model = catalog
            .get(&self.default_model)
            .ok_or_else(|| ConfigError::UnknownDefaultModel(self.default_model.clone()))?;
        if !self.providers.is_configured(model.provider) {
            return Err(ConfigError::MissingCredential {
                model: self.default_model.clone(),
                provider: model.provider,
            });
        }

        let mut seen = std::collections::HashSet::new();
        for connection in &self.connections {
            if !seen.insert(connection.id.as_str()) {
                return Err(ConfigError::DuplicateConnection(connection.id.clone()));
            }
        }
        Ok(())
    }
}
