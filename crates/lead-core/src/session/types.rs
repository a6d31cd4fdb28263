use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::SessionContext;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// What a session is being used for. Selects the system prompt.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    ContentCreation,
    SeoOptimization,
    Rewrite,
    #[default]
    #[serde(alias = "generic")]
    Chat,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContentCreation => "content_creation",
            Self::SeoOptimization => "seo_optimization",
            Self::Rewrite => "rewrite",
            Self::Chat => "chat",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "content_creation" => Some(Self::ContentCreation),
            "seo_optimization" => Some(Self::SeoOptimization),
            "rewrite" => Some(Self::Rewrite),
            "chat" | "generic" => Some(Self::Chat),
            _ => None,
        }
    }
}

/// One completed user/assistant round trip.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: Message,
    pub assistant: Message,
}

impl Exchange {
    pub fn new(user_text: impl Into<String>, assistant_text: impl Into<String>) -> Self {
        let user = Message::user(user_text);
        let mut assistant = Message::assistant(assistant_text);
        // Keep the pair ordered even when both land in the same clock tick.
        if assistant.created_at < user.created_at {
            assistant.created_at = user.created_at;
        }
        Self { user, assistant }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    pub session_type: SessionType,
    /// Logical model key from the catalog, e.g. "gpt-4o".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    messages: Vec<Message>,
    #[serde(default)]
    pub context: SessionContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, session_type: SessionType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            content_id: None,
            session_type,
            model: None,
            messages: Vec::new(),
            context: SessionContext::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Rebuilds a session from persisted parts. Messages must already be in
    /// insertion order.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: String,
        user_id: String,
        content_id: Option<String>,
        session_type: SessionType,
        model: Option<String>,
        messages: Vec<Message>,
        context: SessionContext,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            content_id,
            session_type,
            model,
            messages,
            context,
            created_at,
            updated_at,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_new(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_exchange(&mut self, exchange: Exchange) {
        self.updated_at = exchange.assistant.created_at;
        self.messages.push(exchange.user);
        self.messages.push(exchange.assistant);
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            content_id: self.content_id.clone(),
            session_type: self.session_type,
            model: self.model.clone(),
            message_count: self.messages.len() as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    pub session_type: SessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
