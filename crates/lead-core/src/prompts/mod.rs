//! Prompt assembly.
//!
//! Every function here is a pure string builder: the same inputs always
//! produce the same prompt and nothing touches the network or disk.

mod chat;
mod seo;

pub use chat::{chat_system_prompt, chat_turn, ChatPrompt};
pub use seo::{
    frontmatter_prompt, seo_content_prompt, seo_rewrite_prompt, ContentBrief, FrontmatterBrief,
    RewriteBrief,
};

use serde::{Deserialize, Serialize};

/// Target article length.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LengthBucket {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthBucket {
    /// Inclusive word-count range for the bucket.
    pub fn word_range(self) -> (u32, u32) {
        match self {
            Self::Short => (500, 800),
            Self::Medium => (1000, 1500),
            Self::Long => (2000, 3000),
        }
    }

    pub fn describe(self) -> String {
        let (low, high) = self.word_range();
        format!("{}-{} words", low, high)
    }
}

pub(crate) fn join_or(values: &[String], fallback: &str) -> String {
    let cleaned: Vec<&str> = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.join(", ")
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_buckets_map_to_fixed_ranges() {
        assert_eq!(LengthBucket::Short.word_range(), (500, 800));
        assert_eq!(LengthBucket::Medium.word_range(), (1000, 1500));
        assert_eq!(LengthBucket::Long.word_range(), (2000, 3000));
        assert_eq!(LengthBucket::Long.describe(), "2000-3000 words");
    }

    #[test]
    fn join_or_skips_blank_entries() {
        let values = vec![" seo ".to_string(), "".to_string(), "content".to_string()];
        assert_eq!(join_or(&values, "none"), "seo, content");
        assert_eq!(join_or(&[], "none"), "none");
    }
}
