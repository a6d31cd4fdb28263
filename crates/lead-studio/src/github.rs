//! Git-hosting access for the content studio.
//!
//! [`GitHubClient`] talks to the GitHub REST API: the trees endpoint lists
//! content, the contents endpoint reads and writes single files. Writes carry
//! the blob sha read earlier so a concurrent edit upstream is rejected.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::connection::Connection;
use crate::error::{StudioError, StudioResult};

pub const GITHUB_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("leadchat/", env!("CARGO_PKG_VERSION"));
const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit {
    pub path: String,
    pub content: String,
    /// Blob sha of the version being replaced.
    pub sha: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub path: String,
    pub sha: String,
    pub commit_sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

#[async_trait]
pub trait GitHost: Send + Sync {
    /// Content files and directories under the connection's content dir.
    async fn list_tree(&self, connection: &Connection) -> StudioResult<Vec<TreeEntry>>;

    async fn fetch_file(&self, connection: &Connection, path: &str) -> StudioResult<RemoteFile>;

    async fn commit_file(
        &self,
        connection: &Connection,
        commit: FileCommit,
    ) -> StudioResult<CommitResult>;
}

pub struct GitHubClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: GITHUB_API_URL.to_string(),
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn repo_url(&self, connection: &Connection, rest: &[&str]) -> StudioResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|error| StudioError::InvalidUrl(format!("{}: {}", self.api_base, error)))?;
        url.path_segments_mut()
            .map_err(|_| StudioError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(["repos", connection.owner.as_str(), connection.repo.as_str()])
            .extend(rest.iter().flat_map(|part| part.split('/')).filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn authorized(&self, connection: &Connection, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match connection.token.as_ref().or(self.token.as_ref()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContent,
    commit: PutCommit,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    path: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutCommit {
    sha: String,
    #[serde(default)]
    html_url: Option<String>,
}

fn is_content_file(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| CONTENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn filter_tree(connection: &Connection, items: Vec<TreeItem>) -> Vec<TreeEntry> {
    items
        .into_iter()
        .filter(|item| connection.contains(&item.path))
        .filter_map(|item| {
            let kind = match item.item_type.as_str() {
                "tree" => EntryKind::Directory,
                "blob" if is_content_file(&item.path) => EntryKind::File,
                _ => return None,
            };
            Some(TreeEntry {
                path: item.path,
                kind,
                sha: item.sha,
                size: item.size,
            })
        })
        .collect()
}

fn decode_content(encoded: &str) -> StudioResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|error| StudioError::Decode(error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| StudioError::Decode(error.to_string()))
}

async fn upstream_error(path: &str, response: reqwest::Response) -> StudioError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return StudioError::NotFound(path.to_string());
    }
    let message = match response.text().await {
        Ok(text) => text,
        Err(error) => return StudioError::Http(error),
    };
    StudioError::Upstream {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl GitHost for GitHubClient {
    async fn list_tree(&self, connection: &Connection) -> StudioResult<Vec<TreeEntry>> {
        let url = self.repo_url(connection, &["git", "trees", &connection.branch])?;
        log::debug!(
            "Listing tree of {}/{}@{}",
            connection.owner,
            connection.repo,
            connection.branch
        );
        let response = self
            .authorized(connection, self.client.get(url))
            .query(&[("recursive", "1")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(upstream_error(&connection.branch, response).await);
        }

        let tree: TreeResponse = serde_json::from_str(&response.text().await?)?;
        if tree.truncated {
            log::warn!(
                "Tree listing for {}/{} was truncated by GitHub",
                connection.owner,
                connection.repo
            );
        }
        Ok(filter_tree(connection, tree.tree))
    }

    async fn fetch_file(&self, connection: &Connection, path: &str) -> StudioResult<RemoteFile> {
        let url = self.repo_url(connection, &["contents", path])?;
        let response = self
            .authorized(connection, self.client.get(url))
            .query(&[("ref", connection.branch.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(upstream_error(path, response).await);
        }

        let text = response.text().await?;
        let contents: ContentsResponse = serde_json::from_str(&text).map_err(|_| {
            StudioError::Decode(format!("'{}' is not a file", path))
        })?;
        let content = match contents.encoding.as_deref() {
            Some("base64") | None => decode_content(&contents.content)?,
            Some(other) => {
                return Err(StudioError::Decode(format!(
                    "unsupported content encoding '{}'",
                    other
                )))
            }
        };

        Ok(RemoteFile {
            path: contents.path,
            sha: contents.sha,
            content,
        })
    }

    async fn commit_file(
        &self,
        connection: &Connection,
        commit: FileCommit,
    ) -> StudioResult<CommitResult> {
        let url = self.repo_url(connection, &["contents", &commit.path])?;
        let body = json!({
            "message": commit.message,
            "content": STANDARD.encode(commit.content.as_bytes()),
            "sha": commit.sha,
            "branch": connection.branch,
        });

        log::info!(
            "Committing {} to {}/{}@{}",
            commit.path,
            connection.owner,
            connection.repo,
            connection.branch
        );
        let response = self
            .authorized(connection, self.client.put(url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(upstream_error(&commit.path, response).await);
        }

        let result: PutContentsResponse = serde_json::from_str(&response.text().await?)?;
        Ok(CommitResult {
            path: result.content.path,
            sha: result.content.sha,
            commit_sha: result.commit.sha,
            html_url: result.commit.html_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connection() -> Connection {
        Connection::new("blog", "acme", "site").with_content_dir("content")
    }

    #[test]
    fn test_decode_content_ignores_line_breaks() {
        let encoded = STANDARD.encode("---\ntitle: Hi\n---\nBody\n");
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        assert_eq!(decode_content(&wrapped).unwrap(), "---\ntitle: Hi\n---\nBody\n");
    }

    #[test]
    fn test_filter_tree_keeps_content_under_dir() {
        let item = |path: &str, item_type: &str| TreeItem {
            path: path.to_string(),
            item_type: item_type.to_string(),
            sha: "s".to_string(),
            size: None,
        };
        let entries = filter_tree(
            &connection(),
            vec![
                item("README.md", "blob"),
                item("content", "tree"),
                item("content/posts", "tree"),
                item("content/posts/a.md", "blob"),
                item("content/posts/b.MDX", "blob"),
                item("content/posts/cover.png", "blob"),
            ],
        );
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["content/posts", "content/posts/a.md", "content/posts/b.MDX"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
    }

    #[tokio::test]
    async fn test_list_tree() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/site/git/trees/main"))
            .and(query_param("recursive", "1"))
            .and(header("authorization", "Bearer gh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "root",
                "tree": [
                    { "path": "content/hello.md", "type": "blob", "sha": "a1", "size": 42 },
                    { "path": "src/main.rs", "type": "blob", "sha": "b2" }
                ],
                "truncated": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(Some("gh-token".to_string())).with_base_url(server.uri());
        let entries = client.list_tree(&connection()).await.unwrap();
        assert_eq!(
            entries,
            vec![TreeEntry {
                path: "content/hello.md".to_string(),
                kind: EntryKind::File,
                sha: "a1".to_string(),
                size: Some(42),
            }]
        );
    }

    #[tokio::test]
    async fn test_fetch_file_decodes_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/site/contents/content/hello.md"))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "path": "content/hello.md",
                "sha": "abc123",
                "encoding": "base64",
                "content": STANDARD.encode("# Hello\n"),
            })))
            .mount(&server)
            .await;

        let client = GitHubClient::new(None).with_base_url(server.uri());
        let file = client.fetch_file(&connection(), "content/hello.md").await.unwrap();
        assert_eq!(file.sha, "abc123");
        assert_eq!(file.content, "# Hello\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/site/contents/content/missing.md"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;

        let client = GitHubClient::new(None).with_base_url(server.uri());
        let result = client.fetch_file(&connection(), "content/missing.md").await;
        assert!(matches!(result, Err(StudioError::NotFound(missing)) if missing == "content/missing.md"));
    }

    #[tokio::test]
    async fn test_commit_file_sends_sha_and_branch() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/site/contents/content/hello.md"))
            .and(body_partial_json(json!({
                "message": "Update title",
                "content": STANDARD.encode("# New\n"),
                "sha": "abc123",
                "branch": "main",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": { "path": "content/hello.md", "sha": "def456" },
                "commit": { "sha": "c0ffee", "html_url": "https://github.com/acme/site/commit/c0ffee" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(Some("gh-token".to_string())).with_base_url(server.uri());
        let result = client
            .commit_file(
                &connection(),
                FileCommit {
                    path: "content/hello.md".to_string(),
                    content: "# New\n".to_string(),
                    sha: "abc123".to_string(),
                    message: "Update title".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(result.sha, "def456");
        assert_eq!(result.commit_sha, "c0ffee");
    }

    #[tokio::test]
    async fn test_commit_conflict_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_string("sha mismatch"))
            .mount(&server)
            .await;

        let client = GitHubClient::new(None).with_base_url(server.uri());
        let result = client
            .commit_file(
                &connection(),
                FileCommit {
                    path: "content/hello.md".to_string(),
                    content: "x".to_string(),
                    sha: "stale".to_string(),
                    message: "m".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(StudioError::Upstream { status: 409, .. })));
    }
}
