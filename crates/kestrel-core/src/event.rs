//! Triggering events.

use crate::githost::GitServerKind;
use crate::ids::EventId;
use crate::status::JobStatus;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventCause {
    #[default]
    PullRequest,
    Push,
    Manual,
}

/// A commit on a branch of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub sha: String,
}

impl CommitRef {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            sha: sha.into(),
        }
    }

    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

/// Something that happened on a repository and spawned a set of jobs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    pub id: EventId,
    pub cause: EventCause,
    pub server: GitServerKind,
    pub head: CommitRef,
    pub base: CommitRef,
    pub pull_request: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trigger_user: String,
    pub status: JobStatus,
    pub complete: bool,
    /// Optimistic concurrency counter, bumped by the store on every update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Event {
    pub fn new(cause: EventCause, server: GitServerKind, head: CommitRef, base: CommitRef) -> Self {
        let now = Utc::now();
        Self {
            id: EventId::new(),
            cause,
            server,
            head,
            base,
            pull_request: None,
            description: String::new(),
            trigger_user: String::new(),
            status: JobStatus::NotStarted,
            complete: false,
            version: 0,
            created_at: now,
            last_modified: now,
        }
    }

    pub fn with_pull_request(mut self, number: u64) -> Self {
        self.cause = EventCause::PullRequest;
        self.pull_request = Some(number);
        self
    }

    pub fn is_manual(&self) -> bool {
        self.cause == EventCause::Manual
    }

    pub fn is_pull_request(&self) -> bool {
        self.cause == EventCause::PullRequest
    }

    pub fn cause_str(&self) -> String {
        match self.cause {
            EventCause::PullRequest => "Pull request".to_string(),
            EventCause::Push => format!("Push {}", self.base.branch),
            EventCause::Manual => "Manual".to_string(),
        }
    }

    pub fn status_slug(&self) -> &'static str {
        self.status.slug()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(branch: &str) -> CommitRef {
        CommitRef::new("org", "proj", branch, "0123456789abcdef")
    }

    #[test]
    fn test_cause_str() {
        let mut event = Event::new(
            EventCause::Push,
            GitServerKind::GitHub,
            commit("devel"),
            commit("devel"),
        );
        assert_eq!(event.cause_str(), "Push devel");

        event.cause = EventCause::Manual;
        assert!(event.is_manual());
        assert_eq!(event.cause_str(), "Manual");

        let event = event.with_pull_request(12);
        assert_eq!(event.cause_str(), "Pull request");
        assert_eq!(event.pull_request, Some(12));
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(commit("main").short_sha(), "0123456");
        assert_eq!(CommitRef::new("o", "r", "b", "abc").short_sha(), "abc");
    }

    #[test]
    fn test_short_sha_non_ascii() {
        let commit = CommitRef::new("o", "r", "b", "abcdeféé");
        assert_eq!(commit.short_sha(), "abcdeféé");
    }
}
