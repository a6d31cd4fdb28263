//! Heuristic follow-up suggestions pulled out of assistant replies.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_SUGGESTIONS: usize = 5;

const MIN_SUGGESTION_CHARS: usize = 3;

static SUGGESTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:consider|try|you could|i recommend|suggestion:)\s+([^.!?\n]+)")
        .expect("suggestion pattern is valid")
});

pub trait SuggestionExtractor: Send + Sync {
    /// Returns at most [`MAX_SUGGESTIONS`] suggestions, in the order they
    /// appear in `reply`.
    fn extract(&self, reply: &str) -> Vec<String>;
}

/// Matches fixed phrases such as "consider ...", "try ...", "you could ...",
/// "I recommend ..." and "suggestion: ..." and keeps the rest of the
/// sentence.
#[derive(Debug, Clone, Default)]
pub struct PhraseSuggestionExtractor;

impl PhraseSuggestionExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SuggestionExtractor for PhraseSuggestionExtractor {
    fn extract(&self, reply: &str) -> Vec<String> {
        let mut suggestions: Vec<String> = Vec::new();

        for captures in SUGGESTION_PATTERN.captures_iter(reply) {
            let Some(tail) = captures.get(1) else {
                continue;
            };
            let text = tail
                .as_str()
                .trim()
                .trim_end_matches([',', ';', ':'])
                .trim();
            if text.chars().count() < MIN_SUGGESTION_CHARS {
                continue;
            }

            let suggestion = capitalize(text);
            if suggestions
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(&suggestion))
            {
                continue;
            }

            suggestions.push(suggestion);
            if suggestions.len() == MAX_SUGGESTIONS {
                break;
            }
        }

        suggestions
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
