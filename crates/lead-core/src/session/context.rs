use serde::{Deserialize, Serialize};

/// Results of a competitor review that prompts can draw on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysis {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strengths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl CompetitorAnalysis {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty() && self.gaps.is_empty() && self.keywords.is_empty()
    }
}

/// Per-session working data carried into every prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<CompetitorAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SessionContext {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlays the fields present in `update`. Absent fields keep their
    /// current value.
    pub fn merge(&mut self, update: SessionContext) {
        if !update.target_keywords.is_empty() {
            self.target_keywords = update.target_keywords;
        }
        if update.audience.is_some() {
            self.audience = update.audience;
        }
        if update.tone.is_some() {
            self.tone = update.tone;
        }
        if update.content_title.is_some() {
            self.content_title = update.content_title;
        }
        if update.competitor_analysis.is_some() {
            self.competitor_analysis = update.competitor_analysis;
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
    }

    pub fn merged(mut self, update: Option<SessionContext>) -> Self {
        if let Some(update) = update {
            self.merge(update);
        }
        self
    }
}
