use serde::Serialize;

use super::{join_or, non_empty, seo::competitor_section};
use crate::session::{Message, Role, SessionContext, SessionType};

const CONTENT_CREATION_PROMPT: &str = "You are an expert SEO content strategist. Help the user plan, outline and \
write content that ranks well and converts readers into leads. Ask clarifying questions when the brief is \
incomplete and give concrete, actionable recommendations.";

const SEO_OPTIMIZATION_PROMPT: &str = "You are an SEO optimization specialist. Review content and pages for \
keyword coverage, search intent, metadata and internal linking, and recommend specific improvements.";

const REWRITE_PROMPT: &str = "You are a senior editor. Rewrite the user's text for clarity, flow and \
persuasiveness while keeping its meaning, facts and links intact.";

const CHAT_PROMPT: &str = "You are a helpful assistant for a lead-capture chat agent. Answer concisely, \
stay on topic and guide the visitor toward leaving their contact details when appropriate.";

/// A fully assembled conversation turn ready to send to a provider.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    /// Prior history followed by the new user message.
    pub messages: Vec<Message>,
}

impl ChatPrompt {
    /// Flattens the prompt into a single text block, for providers or logs
    /// that need one string.
    pub fn render(&self) -> String {
        let mut rendered = format!("System: {}\n", self.system);
        for message in &self.messages {
            let label = match message.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            rendered.push_str(&format!("\n{}: {}\n", label, message.content));
        }
        rendered
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
    }
}

pub fn chat_system_prompt(session_type: SessionType, context: &SessionContext) -> String {
    let base = match session_type {
        SessionType::ContentCreation => CONTENT_CREATION_PROMPT,
        SessionType::SeoOptimization => SEO_OPTIMIZATION_PROMPT,
        SessionType::Rewrite => REWRITE_PROMPT,
        SessionType::Chat => CHAT_PROMPT,
    };

    let mut prompt = base.to_string();
    let mut details = Vec::new();

    if let Some(title) = non_empty(context.content_title.as_deref()) {
        details.push(format!("Working title: {}", title));
    }
    if !context.target_keywords.is_empty() {
        details.push(format!(
            "Target keywords: {}",
            join_or(&context.target_keywords, "")
        ));
    }
    if let Some(audience) = non_empty(context.audience.as_deref()) {
        details.push(format!("Audience: {}", audience));
    }
    if let Some(tone) = non_empty(context.tone.as_deref()) {
        details.push(format!("Tone: {}", tone));
    }
    if let Some(notes) = non_empty(context.notes.as_deref()) {
        details.push(format!("Notes: {}", notes));
    }

    if !details.is_empty() {
        prompt.push_str("\n\nSession context:\n");
        prompt.push_str(&details.join("\n"));
    }
    if let Some(analysis) = &context.competitor_analysis {
        prompt.push('\n');
        prompt.push_str(competitor_section(analysis).trim_end());
    }

    prompt
}

/// Builds the prompt for one conversation turn: system instructions for the
/// session type, the whole prior history, then the new user message.
pub fn chat_turn(
    session_type: SessionType,
    context: &SessionContext,
    history: &[Message],
    user_text: &str,
) -> ChatPrompt {
    let mut messages: Vec<Message> = history
        .iter()
        .filter(|message| message.role != Role::System)
        .cloned()
        .collect();
    messages.push(Message::user(user_text));

    ChatPrompt {
        system: chat_system_prompt(session_type, context),
        messages,
    }
}
