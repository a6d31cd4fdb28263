use serde::{Deserialize, Serialize};

use super::{join_or, non_empty, LengthBucket};
use crate::session::CompetitorAnalysis;

const BODY_EXCERPT_CHARS: usize = 1500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBrief {
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub length: LengthBucket,
    #[serde(default)]
    pub competitor_analysis: Option<CompetitorAnalysis>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteBrief {
    pub document: String,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub competitor_domain: Option<String>,
}

impl RewriteBrief {
    /// Whether the model is expected to answer with the JSON envelope that
    /// carries competitor insights alongside the document.
    pub fn wants_insights(&self) -> bool {
        non_empty(self.competitor_domain.as_deref()).is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontmatterBrief {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Keys the front matter must contain. Defaults are used when empty.
    #[serde(default)]
    pub fields: Vec<String>,
}

pub fn seo_content_prompt(brief: &ContentBrief) -> String {
    let mut prompt = String::new();
    prompt.push_str("Write a complete, SEO-optimized article in Markdown.\n\n");
    prompt.push_str(&format!("Title: {}\n", brief.title.trim()));
    prompt.push_str(&format!(
        "Target keywords: {}\n",
        join_or(&brief.keywords, "none specified")
    ));
    prompt.push_str(&format!(
        "Audience: {}\n",
        non_empty(brief.audience.as_deref()).unwrap_or("general readers")
    ));
    prompt.push_str(&format!(
        "Tone: {}\n",
        non_empty(brief.tone.as_deref()).unwrap_or("professional")
    ));
    prompt.push_str(&format!("Length: {}\n", brief.length.describe()));

    if let Some(analysis) = &brief.competitor_analysis {
        prompt.push_str(&competitor_section(analysis));
    }

    prompt.push_str(
        "\nRequirements:\n\
         - Use the primary keyword in the first paragraph and in at least one H2 heading.\n\
         - Structure the article with H2 and H3 headings and short paragraphs.\n\
         - End with a concise conclusion and a clear call to action.\n\
         - Return only the Markdown body, without front matter.\n",
    );
    prompt
}

pub fn seo_rewrite_prompt(brief: &RewriteBrief) -> String {
    let mut prompt = String::new();
    prompt.push_str("Rewrite the following document to improve its quality and search performance.\n\n");

    prompt.push_str(&format!(
        "Instruction: {}\n",
        non_empty(brief.instruction.as_deref())
            .unwrap_or("Improve clarity, structure and keyword coverage without changing the meaning.")
    ));
    prompt.push_str(&format!(
        "Target keywords: {}\n",
        join_or(&brief.keywords, "keep the existing focus")
    ));
    if let Some(tone) = non_empty(brief.tone.as_deref()) {
        prompt.push_str(&format!("Tone: {}\n", tone));
    }

    prompt.push_str(
        "\nKeep the YAML front matter block (between --- lines) intact except where the \
         instruction requires a change. Preserve links and Markdown formatting.\n",
    );

    match non_empty(brief.competitor_domain.as_deref()) {
        Some(domain) => {
            prompt.push_str(&format!(
                "\nCompare the document against the content published on {}. Respond with a JSON \
                 object only, no code fences, shaped as:\n\
                 {{\"document\": \"<full rewritten document>\", \"competitorInsights\": \
                 {{\"domain\": \"{}\", \"strengths\": [], \"gaps\": [], \"keywords\": []}}}}\n",
                domain, domain
            ));
        }
        None => {
            prompt.push_str("\nReturn only the full rewritten document.\n");
        }
    }

    prompt.push_str("\n--- DOCUMENT START ---\n");
    prompt.push_str(&brief.document);
    if !brief.document.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("--- DOCUMENT END ---\n");
    prompt
}

pub fn frontmatter_prompt(brief: &FrontmatterBrief) -> String {
    let fields = if brief.fields.is_empty() {
        vec![
            "title".to_string(),
            "description".to_string(),
            "date".to_string(),
            "tags".to_string(),
            "keywords".to_string(),
        ]
    } else {
        brief.fields.clone()
    };

    let excerpt: String = brief.body.chars().take(BODY_EXCERPT_CHARS).collect();

    let mut prompt = String::new();
    prompt.push_str("Generate YAML front matter for the article below.\n\n");
    prompt.push_str(&format!("Title: {}\n", brief.title.trim()));
    prompt.push_str(&format!(
        "Target keywords: {}\n",
        join_or(&brief.keywords, "derive them from the article")
    ));
    prompt.push_str(&format!("Required keys: {}\n", fields.join(", ")));
    prompt.push_str(
        "\nRules:\n\
         - Keep the description under 160 characters.\n\
         - Use ISO 8601 dates (YYYY-MM-DD).\n\
         - Use YAML lists for tags and keywords.\n\
         - Return only the YAML, without --- delimiters or code fences.\n",
    );
    prompt.push_str("\nArticle excerpt:\n");
    prompt.push_str(&excerpt);
    prompt.push('\n');
    prompt
}

pub(crate) fn competitor_section(analysis: &CompetitorAnalysis) -> String {
    let mut section = format!("\nCompetitor insights ({}):\n", analysis.domain);
    if !analysis.strengths.is_empty() {
        section.push_str(&format!("- Their strengths: {}\n", analysis.strengths.join("; ")));
    }
    if !analysis.gaps.is_empty() {
        section.push_str(&format!("- Gaps to exploit: {}\n", analysis.gaps.join("; ")));
    }
    if !analysis.keywords.is_empty() {
        section.push_str(&format!("- Keywords they rank for: {}\n", analysis.keywords.join(", ")));
    }
    if analysis.is_empty() {
        section.push_str("- Differentiate clearly from this competitor's coverage.\n");
    }
    section
}
