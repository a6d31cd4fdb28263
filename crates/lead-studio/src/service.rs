//! Preview and apply flows for content edits.
//!
//! A preview applies the requested field patches locally and, when asked,
//! runs one AI rewrite over the patched document. Nothing is written
//! upstream until [`StudioService::apply`] commits the patches.

use std::sync::Arc;

use lead_core::prompts::{seo_rewrite_prompt, RewriteBrief};
use lead_core::CompetitorAnalysis;
use lead_llm::{CompletionRequest, ProviderRegistry};
use serde::{Deserialize, Serialize};

use crate::connection::{Connection, ConnectionSummary};
use crate::diff::{line_diff, DiffLine};
use crate::document::{ContentDocument, ContentFile, BODY_FIELD};
use crate::error::{StudioError, StudioResult};
use crate::github::{CommitResult, FileCommit, GitHost, TreeEntry};
use crate::patch::{apply_patches, FieldPatch};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub path: String,
    #[serde(default)]
    pub patches: Vec<FieldPatch>,
    /// Free-form rewrite instruction for the model.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub target_keywords: Vec<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub competitor_domain: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl PreviewRequest {
    fn wants_rewrite(&self) -> bool {
        present(self.prompt.as_deref()).is_some()
            || !self.target_keywords.is_empty()
            || present(self.competitor_domain.as_deref()).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub path: String,
    pub applied_patches: Vec<FieldPatch>,
    pub original: String,
    pub proposed: String,
    pub full_diff: Vec<DiffLine>,
    pub additions: usize,
    pub deletions: usize,
    pub unified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_insights: Option<CompetitorAnalysis>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub path: String,
    #[serde(default)]
    pub patches: Vec<FieldPatch>,
    #[serde(default)]
    pub commit_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub path: String,
    pub applied_patches: Vec<FieldPatch>,
    pub additions: usize,
    pub deletions: usize,
    /// `None` when the patches left the file unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteEnvelope {
    document: String,
    #[serde(default)]
    competitor_insights: Option<CompetitorAnalysis>,
}

pub struct StudioService {
    host: Arc<dyn GitHost>,
    connections: Vec<Connection>,
    registry: Arc<ProviderRegistry>,
    default_model: String,
}

impl StudioService {
    pub fn new(
        host: Arc<dyn GitHost>,
        connections: Vec<Connection>,
        registry: Arc<ProviderRegistry>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            host,
            connections,
            registry,
            default_model: default_model.into(),
        }
    }

    pub fn list_connections(&self) -> Vec<ConnectionSummary> {
        self.connections.iter().map(Connection::summary).collect()
    }

    pub fn connection(&self, id: &str) -> StudioResult<&Connection> {
        self.connections
            .iter()
            .find(|connection| connection.id == id)
            .ok_or_else(|| StudioError::UnknownConnection(id.to_string()))
    }

    pub async fn list_tree(&self, connection_id: &str) -> StudioResult<Vec<TreeEntry>> {
        let connection = self.connection(connection_id)?;
        self.host.list_tree(connection).await
    }

    pub async fn fetch_file(&self, connection_id: &str, path: &str) -> StudioResult<ContentFile> {
        let connection = self.connection(connection_id)?;
        let path = normalize_path(path);
        let (sha, document, _) = self.load(connection, &path).await?;
        ContentFile::from_document(path, sha, &document)
    }

    pub async fn preview(
        &self,
        connection_id: &str,
        mut request: PreviewRequest,
    ) -> StudioResult<Preview> {
        let connection = self.connection(connection_id)?;
        request.path = normalize_path(&request.path);
        let (_, document, original) = self.load(connection, &request.path).await?;

        let mut applied_patches = request.patches.clone();
        let mut proposed = apply_patches(&document, &request.patches)?;
        let mut competitor_insights = None;

        if request.wants_rewrite() {
            let (rewritten, insights) = self.rewrite(&proposed, &request).await?;
            let ai_patches = changed_fields(&proposed, &rewritten)?;
            log::debug!(
                "Rewrite of {} produced {} field change(s)",
                request.path,
                ai_patches.len()
            );
            proposed = apply_patches(&proposed, &ai_patches)?;
            applied_patches.extend(ai_patches);
            competitor_insights = insights;
        }

        let proposed = proposed.render();
        let diff = line_diff(&request.path, &original, &proposed);

        Ok(Preview {
            path: request.path,
            applied_patches,
            original,
            proposed,
            full_diff: diff.lines,
            additions: diff.additions,
            deletions: diff.deletions,
            unified: diff.unified,
            competitor_insights,
        })
    }

    pub async fn apply(
        &self,
        connection_id: &str,
        mut request: ApplyRequest,
    ) -> StudioResult<ApplyOutcome> {
        let message = request.commit_message.trim();
        if message.is_empty() {
            return Err(StudioError::InvalidPatch(
                "commit message must not be empty".to_string(),
            ));
        }
        if request.patches.is_empty() {
            return Err(StudioError::InvalidPatch("no patches to apply".to_string()));
        }

        let connection = self.connection(connection_id)?;
        request.path = normalize_path(&request.path);
        let (sha, document, original) = self.load(connection, &request.path).await?;
        let updated = apply_patches(&document, &request.patches)?.render();
        let diff = line_diff(&request.path, &original, &updated);

        let commit = if diff.is_empty() {
            log::info!("Patches leave {} unchanged, skipping commit", request.path);
            None
        } else {
            let result = self
                .host
                .commit_file(
                    connection,
                    FileCommit {
                        path: request.path.clone(),
                        content: updated,
                        sha,
                        message: message.to_string(),
                    },
                )
                .await?;
            Some(result)
        };

        Ok(ApplyOutcome {
            path: request.path,
            applied_patches: request.patches,
            additions: diff.additions,
            deletions: diff.deletions,
            commit,
        })
    }

    async fn load(
        &self,
        connection: &Connection,
        path: &str,
    ) -> StudioResult<(String, ContentDocument, String)> {
        if !connection.contains(path) {
            return Err(StudioError::NotFound(path.to_string()));
        }
        let file = self.host.fetch_file(connection, path).await?;
        let document = ContentDocument::parse(&file.content)?;
        Ok((file.sha, document, file.content))
    }

    async fn rewrite(
        &self,
        document: &ContentDocument,
        request: &PreviewRequest,
    ) -> StudioResult<(ContentDocument, Option<CompetitorAnalysis>)> {
        let model = present(request.model.as_deref()).unwrap_or(self.default_model.as_str());
        let resolved = self.registry.resolve(model)?;

        let brief = RewriteBrief {
            document: document.render(),
            instruction: request.prompt.clone(),
            keywords: request.target_keywords.clone(),
            tone: request.tone.clone(),
            competitor_domain: request.competitor_domain.clone(),
        };
        let completion = resolved
            .provider
            .complete(CompletionRequest::single(
                resolved.provider_model(),
                seo_rewrite_prompt(&brief),
            ))
            .await
            .map_err(|error| {
                log::error!("Rewrite with model {} failed: {}", model, error);
                error
            })?;

        let (text, insights) = parse_rewrite(&completion.text, brief.competitor_domain.as_deref());
        let mut text = text;
        if brief.document.ends_with('\n') && !text.ends_with('\n') {
            text.push('\n');
        }
        let rewritten = ContentDocument::parse(&text).map_err(|error| {
            log::warn!("Rewrite with model {} returned an unusable document: {}", model, error);
            StudioError::InvalidOutput(error.to_string())
        })?;
        Ok((rewritten, insights))
    }
}

/// Repository-relative form of a client supplied path.
fn normalize_path(path: &str) -> String {
    path.trim().trim_start_matches('/').to_string()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    let Some((_, inner)) = rest.split_once('\n') else {
        return text;
    };
    inner.strip_suffix("```").unwrap_or(inner)
}

/// Splits the model's answer into the rewritten document and, when a
/// competitor domain was requested, its insights. Answers that are not the
/// expected JSON envelope are taken as the document itself.
fn parse_rewrite(text: &str, competitor_domain: Option<&str>) -> (String, Option<CompetitorAnalysis>) {
    let stripped = strip_code_fences(text);
    let Some(domain) = present(competitor_domain) else {
        return (stripped.to_string(), None);
    };

    match serde_json::from_str::<RewriteEnvelope>(stripped.trim()) {
        Ok(envelope) => {
            let insights = envelope.competitor_insights.map(|mut insights| {
                if insights.domain.trim().is_empty() {
                    insights.domain = domain.to_string();
                }
                insights
            });
            (envelope.document, insights)
        }
        Err(error) => {
            log::warn!("Rewrite answer was not a JSON envelope: {}", error);
            (stripped.to_string(), None)
        }
    }
}

/// Replace patches turning `current` into `rewritten`, limited to fields
/// that exist and are editable in `current`.
fn changed_fields(
    current: &ContentDocument,
    rewritten: &ContentDocument,
) -> StudioResult<Vec<FieldPatch>> {
    let rewritten_fields = rewritten.fields()?;
    let mut patches = Vec::new();

    for field in current.fields()? {
        if !field.editable {
            continue;
        }
        let Some(candidate) = rewritten_fields.iter().find(|f| f.path == field.path) else {
            continue;
        };
        if candidate.value == field.value {
            continue;
        }
        if !field.field_type.accepts(&candidate.value) {
            log::debug!("Ignoring rewrite of '{}' with a mismatched type", field.path);
            continue;
        }
        patches.push(FieldPatch::replace(field.path.clone(), candidate.value.clone()));
    }

    let dropped = rewritten_fields
        .iter()
        .filter(|f| f.path != BODY_FIELD && current.field(&f.path).ok().flatten().is_none())
        .count();
    if dropped > 0 {
        log::debug!("Ignoring {} field(s) the rewrite added", dropped);
    }
    Ok(patches)
}
