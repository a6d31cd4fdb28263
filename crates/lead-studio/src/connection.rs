use serde::{Deserialize, Serialize};

/// A repository the content studio can read from and commit to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory holding the content files, relative to the repo root.
    #[serde(default)]
    pub content_dir: String,
    /// Overrides the globally configured Git-hosting token.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Connection {
    pub fn new(id: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            content_dir: String::new(),
            token: None,
        }
    }

    pub fn with_content_dir(mut self, content_dir: impl Into<String>) -> Self {
        self.content_dir = content_dir.into();
        self
    }

    /// Whether `path` lies inside the configured content directory.
    pub fn contains(&self, path: &str) -> bool {
        let dir = self.content_dir.trim_matches('/');
        if dir.is_empty() {
            return true;
        }
        path.strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            id: self.id.clone(),
            provider: "github".to_string(),
            repository: format!("{}/{}", self.owner, self.repo),
            branch: self.branch.clone(),
            content_dir: self.content_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub id: String,
    pub provider: String,
    pub repository: String,
    pub branch: String,
    pub content_dir: String,
}
