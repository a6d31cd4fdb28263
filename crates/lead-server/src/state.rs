use std::sync::Arc;

use anyhow::Context;
use lead_core::{PhraseSuggestionExtractor, SessionStore, SqliteSessionStore};
use lead_llm::{ModelCatalog, ProviderRegistry};
use lead_studio::{Connection, GitHost, GitHubClient, StudioService};

use crate::config::ServerConfig;
use crate::services::{ContentService, ConversationService};

pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub default_model: String,
    pub conversation: ConversationService,
    pub content: ContentService,
    pub studio: StudioService,
}

impl AppState {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn SessionStore>,
        git_host: Arc<dyn GitHost>,
        connections: Vec<Connection>,
        default_model: impl Into<String>,
    ) -> Self {
        let default_model = default_model.into();
        Self {
            conversation: ConversationService::new(
                store,
                registry.clone(),
                Arc::new(PhraseSuggestionExtractor::new()),
                default_model.clone(),
            ),
            content: ContentService::new(registry.clone(), default_model.clone()),
            studio: StudioService::new(git_host, connections, registry.clone(), default_model.clone()),
            registry,
            default_model,
        }
    }

    /// Validates `config`, opens the session database and builds every
    /// client. Fails when the server must not start.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let catalog = ModelCatalog::builtin();
        config.validate(&catalog)?;
        let registry = Arc::new(ProviderRegistry::from_config(catalog, &config.providers));

        if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let store = SqliteSessionStore::new(&config.database);
        store
            .init()
            .await
            .with_context(|| format!("Failed to open {}", config.database.display()))?;
        log::info!("Session store: {}", config.database.display());

        let mut github = GitHubClient::new(config.github.token.clone());
        if let Some(api_url) = config.github.api_url.as_deref() {
            github = github.with_base_url(api_url);
        }
        if config.connections.is_empty() {
            log::warn!("No studio connections configured");
        }

        Ok(Self::new(
            registry,
            Arc::new(store),
            Arc::new(github),
            config.connections.clone(),
            config.default_model.clone(),
        ))
    }
}
