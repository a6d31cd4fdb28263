use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{SessionFilter, SessionStore};
use crate::error::{StoreError, StoreResult};
use crate::session::{Exchange, Message, Role, Session, SessionContext, SessionSummary, SessionType};

const DEFAULT_LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db_path: PathBuf,
}

impl SqliteSessionStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn with_connection<T, F>(&self, func: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = open_connection(&db_path)?;
            func(&mut connection)
        })
        .await
        .map_err(|error| StoreError::Task(error.to_string()))?
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn init(&self) -> StoreResult<()> {
        self.with_connection(|connection| {
            connection.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    content_id TEXT,
                    session_type TEXT NOT NULL,
                    model TEXT,
                    context TEXT NOT NULL DEFAULT '{}',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS session_messages (
                    session_id TEXT NOT NULL,
                    seq INTEGER NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (session_id, seq),
                    FOREIGN KEY(session_id) REFERENCES sessions(id)
                );

                CREATE TRIGGER IF NOT EXISTS session_messages_no_update
                BEFORE UPDATE ON session_messages
                BEGIN
                    SELECT RAISE(ABORT, 'session messages are append-only');
                END;

                CREATE TRIGGER IF NOT EXISTS session_messages_no_delete
                BEFORE DELETE ON session_messages
                BEGIN
                    SELECT RAISE(ABORT, 'session messages are append-only');
                END;

                CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, updated_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_content ON sessions(content_id);
                "#,
            )?;
            Ok(())
        })
        .await
    }

    async fn load_session(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let session_id = session_id.to_string();

        self.with_connection(move |connection| {
            let header = connection
                .query_row(
                    r#"
                    SELECT id, user_id, content_id, session_type, model, context, created_at, updated_at
                    FROM sessions WHERE id = ?1
                    "#,
                    params![session_id],
                    |row| {
                        Ok(RawSession {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            content_id: row.get(2)?,
                            session_type: row.get(3)?,
                            model: row.get(4)?,
                            context: row.get(5)?,
                            created_at: row.get(6)?,
                            updated_at: row.get(7)?,
                        })
                    },
                )
                .optional()?;

            let Some(header) = header else {
                return Ok(None);
            };

            let mut statement = connection.prepare(
                "SELECT role, content, created_at FROM session_messages WHERE session_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = statement.query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut messages = Vec::new();
            for row in rows {
                let (role, content, created_at) = row?;
                let role = Role::from_db(&role)
                    .ok_or_else(|| StoreError::InvalidData(format!("unknown role {}", role)))?;
                messages.push(Message {
                    role,
                    content,
                    created_at: parse_timestamp(&created_at)?,
                });
            }

            Ok(Some(header.into_session(messages)?))
        })
        .await
    }

    async fn list_sessions(&self, filter: SessionFilter) -> StoreResult<Vec<SessionSummary>> {
        self.with_connection(move |connection| {
            let limit = i64::from(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));
            let mut statement = connection.prepare(
                r#"
                SELECT s.id, s.user_id, s.content_id, s.session_type, s.model,
                       s.created_at, s.updated_at,
                       (SELECT COUNT(*) FROM session_messages m WHERE m.session_id = s.id)
                FROM sessions s
                WHERE (?1 IS NULL OR s.user_id = ?1)
                  AND (?2 IS NULL OR s.content_id = ?2)
                ORDER BY s.updated_at DESC
                LIMIT ?3
                "#,
            )?;
            let rows = statement.query_map(
                params![filter.user_id, filter.content_id, limit],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )?;

            let mut summaries = Vec::new();
            for row in rows {
                let (id, user_id, content_id, session_type, model, created_at, updated_at, count) =
                    row?;
                summaries.push(SessionSummary {
                    id,
                    user_id,
                    content_id,
                    session_type: parse_session_type(&session_type)?,
                    model,
                    message_count: u32::try_from(count).unwrap_or(u32::MAX),
                    created_at: parse_timestamp(&created_at)?,
                    updated_at: parse_timestamp(&updated_at)?,
                });
            }
            Ok(summaries)
        })
        .await
    }

    async fn append_exchange(&self, session: &Session, exchange: &Exchange) -> StoreResult<u32> {
        let session_id = session.id.clone();
        let user_id = session.user_id.clone();
        let content_id = session.content_id.clone();
        let session_type = session.session_type.as_str();
        let model = session.model.clone();
        let context = serde_json::to_string(&session.context)?;
        let created_at = format_timestamp(session.created_at);
        let updated_at = format_timestamp(exchange.assistant.created_at);
        let turns = [exchange.user.clone(), exchange.assistant.clone()];

        self.with_connection(move |connection| {
            let tx = connection.transaction()?;
            tx.execute(
                r#"
                INSERT INTO sessions (
                    id, user_id, content_id, session_type, model, context, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(id) DO UPDATE SET
                    model = excluded.model,
                    context = excluded.context,
                    updated_at = excluded.updated_at
                "#,
                params![
                    session_id,
                    user_id,
                    content_id,
                    session_type,
                    model,
                    context,
                    created_at,
                    updated_at
                ],
            )?;

            let last_seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) FROM session_messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;

            for (offset, message) in turns.iter().enumerate() {
                tx.execute(
                    r#"
                    INSERT INTO session_messages (session_id, seq, role, content, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        session_id,
                        last_seq + offset as i64 + 1,
                        message.role.as_str(),
                        message.content,
                        format_timestamp(message.created_at)
                    ],
                )?;
            }
            tx.commit()?;

            u32::try_from(last_seq + turns.len() as i64)
                .map_err(|error| StoreError::InvalidData(error.to_string()))
        })
        .await
    }
}

struct RawSession {
    id: String,
    user_id: String,
    content_id: Option<String>,
    session_type: String,
    model: Option<String>,
    context: String,
    created_at: String,
    updated_at: String,
}

impl RawSession {
    fn into_session(self, messages: Vec<Message>) -> StoreResult<Session> {
        let context: SessionContext = serde_json::from_str(&self.context)?;
        Ok(Session::restore(
            self.id,
            self.user_id,
            self.content_id,
            parse_session_type(&self.session_type)?,
            self.model,
            messages,
            context,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        ))
    }
}

fn open_connection(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let connection = Connection::open(path)?;
    connection.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        "#,
    )?;
    Ok(connection)
}

fn parse_session_type(raw: &str) -> StoreResult<SessionType> {
    SessionType::from_db(raw)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown session type {}", raw)))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
