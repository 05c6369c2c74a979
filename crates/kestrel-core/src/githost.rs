//! Git hosting providers.
//!
//! Each provider kind maps to one [`GitHostApi`] implementation through the
//! [`GitHostRegistry`]. Adding a provider means registering an implementation,
//! dispatch code stays untouched.

use crate::event::CommitRef;
use crate::{Error, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GitServerKind {
    GitHub,
    GitLab,
    BitBucket,
}

impl fmt::Display for GitServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GitServerKind::GitHub => "GitHub",
            GitServerKind::GitLab => "GitLab",
            GitServerKind::BitBucket => "BitBucket",
        };
        f.write_str(name)
    }
}

/// State of a commit status check on the git host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub state: CommitState,
    pub target_url: Option<String>,
    pub description: String,
    /// Name of the check, usually the recipe name and build config.
    pub context: String,
}

/// API surface of a git hosting provider used by the core.
#[async_trait]
pub trait GitHostApi: Send + Sync {
    fn kind(&self) -> GitServerKind;

    fn repo_url(&self, owner: &str, repo: &str) -> String;

    fn commit_html_url(&self, owner: &str, repo: &str, sha: &str) -> String;

    async fn update_commit_status(&self, commit: &CommitRef, status: &CommitStatus) -> Result<()>;

    async fn add_pr_label(&self, owner: &str, repo: &str, pr_number: u64, label: &str)
    -> Result<()>;
}

/// Lookup from server kind to provider implementation.
#[derive(Default, Clone)]
pub struct GitHostRegistry {
    apis: HashMap<GitServerKind, Arc<dyn GitHostApi>>,
}

impl GitHostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation under the kind it reports.
    pub fn register(&mut self, api: Arc<dyn GitHostApi>) {
        let kind = api.kind();
        info!(server = %kind, "Registering git host API");
        self.apis.insert(kind, api);
    }

    pub fn with(mut self, api: Arc<dyn GitHostApi>) -> Self {
        self.register(api);
        self
    }

    pub fn api(&self, kind: GitServerKind) -> Result<Arc<dyn GitHostApi>> {
        self.apis
            .get(&kind)
            .cloned()
            .ok_or(Error::UnsupportedServer(kind))
    }

    pub fn supports(&self, kind: GitServerKind) -> bool {
        self.apis.contains_key(&kind)
    }
}

impl fmt::Debug for GitHostRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHostRegistry")
            .field("kinds", &self.apis.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GitLabStub;

    #[async_trait]
    impl GitHostApi for GitLabStub {
        fn kind(&self) -> GitServerKind {
            GitServerKind::GitLab
        }

        fn repo_url(&self, owner: &str, repo: &str) -> String {
            format!("https://gitlab.example.com/{owner}/{repo}")
        }

        fn commit_html_url(&self, owner: &str, repo: &str, sha: &str) -> String {
            format!("{}/-/commit/{sha}", self.repo_url(owner, repo))
        }

        async fn update_commit_status(&self, _: &CommitRef, _: &CommitStatus) -> Result<()> {
            Ok(())
        }

        async fn add_pr_label(&self, _: &str, _: &str, _: u64, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lookup_registered_kind() {
        let registry = GitHostRegistry::new().with(Arc::new(GitLabStub));
        let api = registry.api(GitServerKind::GitLab).unwrap();
        assert_eq!(
            api.commit_html_url("org", "proj", "abc"),
            "https://gitlab.example.com/org/proj/-/commit/abc"
        );
        assert!(registry.supports(GitServerKind::GitLab));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let registry = GitHostRegistry::new().with(Arc::new(GitLabStub));
        let err = registry.api(GitServerKind::BitBucket).err().unwrap();
        assert!(matches!(err, Error::UnsupportedServer(GitServerKind::BitBucket)));
        assert_eq!(err.to_string(), "Unsupported git server: BitBucket");
    }
}
