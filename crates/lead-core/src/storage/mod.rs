mod sqlite;

pub use sqlite::SqliteSessionStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::session::{Exchange, Session, SessionSummary};

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub user_id: Option<String>,
    pub content_id: Option<String>,
    pub limit: Option<u32>,
}

/// Persistence for conversation sessions.
///
/// Messages are append-only: the only write path for them is
/// [`SessionStore::append_exchange`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn init(&self) -> StoreResult<()>;

    async fn load_session(&self, session_id: &str) -> StoreResult<Option<Session>>;

    async fn list_sessions(&self, filter: SessionFilter) -> StoreResult<Vec<SessionSummary>>;

    /// Writes the session header (created on first use, context and model
    /// updated otherwise) and appends both turns in one transaction.
    /// Returns the session's message count afterwards.
    async fn append_exchange(&self, session: &Session, exchange: &Exchange) -> StoreResult<u32>;
}
