pub mod content;
pub mod conversation;

pub use content::{ContentService, FrontmatterRequest, GenerateRequest, GeneratedText};
pub use conversation::{ConversationService, ExchangeOutcome, ExchangeRequest};

/// Picks the first non-blank model key.
pub(crate) fn model_key<'a>(
    requested: Option<&'a str>,
    session: Option<&'a str>,
    default: &'a str,
) -> &'a str {
    [requested, session]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .unwrap_or(default)
}
