//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the orchestration core and
//! its adapters: the transactional store, the audit log and the remote
//! status notifier.

use crate::client::BuildClient;
use crate::event::Event;
use crate::ids::*;
use crate::job::{Job, StepResult};
use crate::recipe::Recipe;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Repository for recipes. Read-only to the scheduler.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Store a new recipe.
    async fn create(&self, recipe: &Recipe) -> Result<RecipeId>;

    /// Get a recipe by ID.
    async fn get(&self, id: RecipeId) -> Result<Option<Recipe>>;

    /// Get every recipe in `ids` that exists.
    async fn get_many(&self, ids: &[RecipeId]) -> Result<Vec<Recipe>>;

    /// List the recipes of a repository (`owner/name`).
    async fn list_for_repository(&self, repository: &str) -> Result<Vec<Recipe>>;
}

/// Repository for events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Store a new event.
    async fn create(&self, event: &Event) -> Result<EventId>;

    /// Get an event by ID.
    async fn get(&self, id: EventId) -> Result<Option<Event>>;

    /// Update an event. Fails with [`Error::Conflict`] when `event.version`
    /// is stale; on success the version is bumped in place.
    async fn update(&self, event: &mut Event) -> Result<()>;
}

/// Repository for jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Store a new job.
    async fn create(&self, job: &Job) -> Result<JobId>;

    /// Get a job by ID.
    async fn get(&self, id: JobId) -> Result<Option<Job>>;

    /// All jobs of an event.
    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Job>>;

    /// Update a job. Fails with [`Error::Conflict`] when `job.version` is
    /// stale; on success the version is bumped in place.
    async fn update(&self, job: &mut Job) -> Result<()>;

    /// Atomically hand a claimable job to a client. Fails with
    /// [`Error::NotClaimable`] when another client got there first or the
    /// job is not ready.
    async fn claim(&self, id: JobId, client: ClientId) -> Result<Job>;

    /// Claimable jobs for the given build configs, highest recipe priority first.
    async fn list_claimable(&self, configs: &[String], limit: usize) -> Result<Vec<Job>>;
}

/// Repository for build clients.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn register(&self, client: &BuildClient) -> Result<ClientId>;

    async fn get(&self, id: ClientId) -> Result<Option<BuildClient>>;

    async fn update(&self, client: &BuildClient) -> Result<()>;

    async fn list(&self) -> Result<Vec<BuildClient>>;
}

/// One audit record about a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub job_id: JobId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only job change log.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, job_id: JobId, message: &str) -> Result<()>;

    async fn entries(&self, job_id: JobId) -> Result<Vec<AuditEntry>>;
}

/// Reports state transitions to the git host.
#[async_trait]
pub trait RemoteStatusNotifier: Send + Sync {
    /// A job was canceled.
    async fn job_canceled(&self, job_url: &str, job: &Job, event: &Event) -> Result<()>;

    /// An event reached a terminal state.
    async fn event_complete(&self, event: &Event, jobs: &[Job]) -> Result<()>;

    /// A step of a job started running.
    async fn step_started(&self, step: &StepResult, job: &Job, event: &Event) -> Result<()>;
}

/// A notifier together with what it needs to build links.
#[derive(Clone)]
pub struct NotifyContext {
    pub notifier: Arc<dyn RemoteStatusNotifier>,
    base_url: Url,
}

impl NotifyContext {
    pub fn new(notifier: Arc<dyn RemoteStatusNotifier>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("base url {base_url}: {e}")))?;
        Ok(Self { notifier, base_url })
    }

    /// Absolute link to a job page.
    pub fn job_url(&self, job_id: JobId) -> String {
        format!(
            "{}/job/{}/",
            self.base_url.as_str().trim_end_matches('/'),
            job_id
        )
    }

    /// Report a canceled job. Failures are logged, never returned.
    pub async fn job_canceled(&self, job: &Job, event: &Event) {
        let url = self.job_url(job.id);
        if let Err(e) = self.notifier.job_canceled(&url, job, event).await {
            warn!(job_id = %job.id, error = %e, "Failed to report canceled job");
        }
    }

    /// Report a completed event. Failures are logged, never returned.
    pub async fn event_complete(&self, event: &Event, jobs: &[Job]) {
        if let Err(e) = self.notifier.event_complete(event, jobs).await {
            warn!(event_id = %event.id, error = %e, "Failed to report completed event");
        }
    }

    /// Report a started step. Failures are logged, never returned.
    pub async fn step_started(&self, step: &StepResult, job: &Job, event: &Event) {
        if let Err(e) = self.notifier.step_started(step, job, event).await {
            warn!(job_id = %job.id, step = %step.name, error = %e, "Failed to report step start");
        }
    }
}
