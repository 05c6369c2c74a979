//! Test doubles for the notifier and git host ports.

use async_trait::async_trait;
use kestrel_core::event::{CommitRef, Event};
use kestrel_core::githost::{CommitStatus, GitHostApi, GitServerKind};
use kestrel_core::ids::{EventId, JobId};
use kestrel_core::job::{Job, StepResult};
use kestrel_core::ports::RemoteStatusNotifier;
use kestrel_core::status::JobStatus;
use kestrel_core::{Error, Result};
use std::sync::Mutex;

/// One call received by a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    JobCanceled { job: JobId, url: String },
    EventComplete { event: EventId, status: JobStatus },
    StepStarted { job: JobId, position: u32 },
}

/// Notifier that records every call, optionally failing each one.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifyCall>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but reports every one of them as failed.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn event_completions(&self, event_id: EventId) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifyCall::EventComplete { event, .. } if *event == event_id))
            .count()
    }

    pub fn canceled_jobs(&self) -> Vec<JobId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                NotifyCall::JobCanceled { job, .. } => Some(job),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: NotifyCall) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.fail {
            return Err(Error::Notification("remote unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStatusNotifier for RecordingNotifier {
    async fn job_canceled(&self, job_url: &str, job: &Job, _event: &Event) -> Result<()> {
        self.record(NotifyCall::JobCanceled {
            job: job.id,
            url: job_url.to_string(),
        })
    }

    async fn event_complete(&self, event: &Event, _jobs: &[Job]) -> Result<()> {
        self.record(NotifyCall::EventComplete {
            event: event.id,
            status: event.status,
        })
    }

    async fn step_started(&self, step: &StepResult, job: &Job, _event: &Event) -> Result<()> {
        self.record(NotifyCall::StepStarted {
            job: job.id,
            position: step.position,
        })
    }
}

/// Git host that keeps the statuses and labels it was sent.
#[derive(Debug)]
pub struct FakeGitHost {
    kind: GitServerKind,
    statuses: Mutex<Vec<(String, CommitStatus)>>,
    labels: Mutex<Vec<(u64, String)>>,
}

impl FakeGitHost {
    pub fn new(kind: GitServerKind) -> Self {
        Self {
            kind,
            statuses: Mutex::default(),
            labels: Mutex::default(),
        }
    }

    /// Statuses sent, keyed by commit sha.
    pub fn statuses(&self) -> Vec<(String, CommitStatus)> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn labels(&self) -> Vec<(u64, String)> {
        self.labels.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GitHostApi for FakeGitHost {
    fn kind(&self) -> GitServerKind {
        self.kind
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("https://git.example.com/{owner}/{repo}")
    }

    fn commit_html_url(&self, owner: &str, repo: &str, sha: &str) -> String {
        format!("{}/commit/{sha}", self.repo_url(owner, repo))
    }

    async fn update_commit_status(&self, commit: &CommitRef, status: &CommitStatus) -> Result<()> {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push((commit.sha.clone(), status.clone()));
        }
        Ok(())
    }

    async fn add_pr_label(&self, _owner: &str, _repo: &str, pr_number: u64, label: &str) -> Result<()> {
        if let Ok(mut labels) = self.labels.lock() {
            labels.push((pr_number, label.to_string()));
        }
        Ok(())
    }
}
