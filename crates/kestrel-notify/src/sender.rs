//! Commit status sender.

use async_trait::async_trait;
use kestrel_core::config::NotifyConfig;
use kestrel_core::event::Event;
use kestrel_core::githost::{CommitState, CommitStatus, GitHostRegistry};
use kestrel_core::job::{Job, StepResult};
use kestrel_core::ports::RemoteStatusNotifier;
use kestrel_core::status::JobStatus;
use kestrel_core::Result;
use tracing::{debug, info};

/// Commit state shown on the git host for a job status.
pub fn commit_state(status: JobStatus) -> CommitState {
    match status {
        JobStatus::Success | JobStatus::FailedOk => CommitState::Success,
        JobStatus::Failed => CommitState::Failure,
        JobStatus::Canceled => CommitState::Error,
        JobStatus::NotStarted | JobStatus::Running | JobStatus::ActivationRequired => {
            CommitState::Pending
        }
    }
}

/// Name of the status check for a job.
pub fn status_context(job: &Job) -> String {
    format!("{} ({})", job.recipe_name, job.config)
}

/// Reports job and event transitions of pull request events as commit
/// statuses and labels.
pub struct CommitStatusNotifier {
    registry: GitHostRegistry,
    failed_but_allowed_label: Option<String>,
}

impl CommitStatusNotifier {
    pub fn new(registry: GitHostRegistry, config: &NotifyConfig) -> Self {
        Self {
            registry,
            failed_but_allowed_label: config.failed_but_allowed_label.clone(),
        }
    }

    async fn send(&self, event: &Event, status: CommitStatus) -> Result<()> {
        let api = self.registry.api(event.server)?;
        debug!(
            server = %event.server,
            sha = %event.head.short_sha(),
            context = %status.context,
            state = ?status.state,
            "Updating commit status"
        );
        api.update_commit_status(&event.head, &status).await
    }
}

#[async_trait]
impl RemoteStatusNotifier for CommitStatusNotifier {
    async fn job_canceled(&self, job_url: &str, job: &Job, event: &Event) -> Result<()> {
        if !event.is_pull_request() {
            return Ok(());
        }
        let status = CommitStatus {
            state: commit_state(job.status),
            target_url: Some(job_url.to_string()),
            description: job.status.label().to_string(),
            context: status_context(job),
        };
        self.send(event, status).await
    }

    async fn event_complete(&self, event: &Event, jobs: &[Job]) -> Result<()> {
        let Some(label) = &self.failed_but_allowed_label else {
            return Ok(());
        };
        let Some(pr_number) = event.pull_request.filter(|_| event.is_pull_request()) else {
            return Ok(());
        };
        if !jobs.iter().any(|j| j.status == JobStatus::FailedOk) {
            return Ok(());
        }

        let api = self.registry.api(event.server)?;
        api.add_pr_label(&event.base.owner, &event.base.repo, pr_number, label)
            .await?;
        info!(
            event_id = %event.id,
            pr = pr_number,
            label = %label,
            "Labeled pull request with allowed failures"
        );
        Ok(())
    }

    async fn step_started(&self, step: &StepResult, job: &Job, event: &Event) -> Result<()> {
        if !event.is_pull_request() {
            return Ok(());
        }
        let status = CommitStatus {
            state: CommitState::Pending,
            target_url: None,
            description: format!("Running {}", step.name),
            context: status_context(job),
        };
        self.send(event, status).await
    }
}
