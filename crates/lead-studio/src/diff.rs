use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Added,
    Removed,
}

/// One changed line. Removed lines carry their line number in the old
/// text, added lines their number in the new text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    pub kind: DiffKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<usize>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineDiff {
    pub lines: Vec<DiffLine>,
    pub additions: usize,
    pub deletions: usize,
    /// Unified diff text with three lines of context.
    pub unified: String,
}

impl LineDiff {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub fn line_diff(path: &str, old: &str, new: &str) -> LineDiff {
    let diff = TextDiff::from_lines(old, new);
    let mut lines = Vec::new();
    let mut additions = 0;
    let mut deletions = 0;

    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Delete => {
                deletions += 1;
                DiffKind::Removed
            }
            ChangeTag::Insert => {
                additions += 1;
                DiffKind::Added
            }
            ChangeTag::Equal => continue,
        };
        lines.push(DiffLine {
            kind,
            old_line: change.old_index().map(|index| index + 1),
            new_line: change.new_index().map(|index| index + 1),
            content: change.value().trim_end_matches(['\n', '\r']).to_string(),
        });
    }

    let unified = if lines.is_empty() {
        String::new()
    } else {
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("a/{}", path), &format!("b/{}", path))
            .to_string()
    };

    LineDiff {
        lines,
        additions,
        deletions,
        unified,
    }
}
