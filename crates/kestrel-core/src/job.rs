//! Job and step result types.

use crate::ids::{ClientId, EventId, JobId, RecipeId, StepResultId};
use crate::recipe::{Recipe, StepDefinition};
use crate::status::JobStatus;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One recipe instantiated for one event and one build configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: JobId,
    pub event_id: EventId,
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    /// Build configuration the job runs under (e.g. `linux-gnu`).
    pub config: String,
    /// Client that claimed the job.
    pub client: Option<ClientId>,
    pub status: JobStatus,
    pub complete: bool,
    pub active: bool,
    /// Eligible for a client to claim.
    pub ready: bool,
    /// Will never run because an upstream dependency failed.
    pub invalidated: bool,
    /// Optimistic concurrency counter, bumped by the store on every update.
    pub version: u64,
    pub step_results: Vec<StepResult>,
    pub seconds: u64,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Job {
    /// Instantiate a recipe for an event. Step results are copied from the
    /// recipe so later recipe edits do not rewrite history.
    pub fn for_recipe(recipe: &Recipe, event_id: EventId, config: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut step_results: Vec<StepResult> =
            recipe.steps.iter().map(StepResult::from_definition).collect();
        step_results.sort_by_key(|s| s.position);

        Self {
            id: JobId::new(),
            event_id,
            recipe_id: recipe.id,
            recipe_name: recipe.name.clone(),
            config: config.into(),
            client: None,
            status: JobStatus::NotStarted,
            complete: false,
            active: recipe.active,
            ready: false,
            invalidated: false,
            version: 0,
            step_results,
            seconds: 0,
            created_at: now,
            last_modified: now,
        }
    }

    /// Status for display; `ActivationRequired` for inactive jobs that never started.
    pub fn display_status(&self) -> JobStatus {
        JobStatus::displayed(self.status, self.active)
    }

    pub fn status_slug(&self) -> &'static str {
        self.display_status().slug()
    }

    pub fn failed(&self) -> bool {
        self.status.is_failure()
    }

    /// The step responsible for a failed job. Hard failures win over
    /// allowed failures, then the earliest modification wins.
    pub fn failed_result(&self) -> Option<&StepResult> {
        if !self.failed() {
            return None;
        }
        self.step_results
            .iter()
            .filter(|s| s.status.is_failure())
            .min_by_key(|s| (s.status, s.last_modified))
    }

    pub fn step(&self, position: u32) -> Option<&StepResult> {
        self.step_results.iter().find(|s| s.position == position)
    }

    pub fn step_mut(&mut self, position: u32) -> Option<&mut StepResult> {
        self.step_results.iter_mut().find(|s| s.position == position)
    }

    /// Whether a client may claim this job right now.
    pub fn is_claimable(&self) -> bool {
        self.ready && self.active && !self.complete && !self.invalidated && self.client.is_none()
    }

    /// Whether the job is finished. Invalidated jobs are always settled.
    pub fn is_settled(&self) -> bool {
        self.complete || self.invalidated
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Canceled;
        self.complete = true;
        self.ready = false;
        self.last_modified = Utc::now();
    }

    /// Settle a job whose dependency will never allow it to run.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
        self.cancel();
    }
}

/// Outcome of one step of a job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepResult {
    pub id: StepResultId,
    pub position: u32,
    pub name: String,
    pub filename: String,
    pub abort_on_failure: bool,
    pub allowed_to_fail: bool,
    pub exit_status: i32,
    pub status: JobStatus,
    pub complete: bool,
    pub output: String,
    pub seconds: u64,
    pub last_modified: DateTime<Utc>,
}

impl StepResult {
    pub fn from_definition(step: &StepDefinition) -> Self {
        Self {
            id: StepResultId::new(),
            position: step.position,
            name: step.name.clone(),
            filename: step.filename.clone(),
            abort_on_failure: step.abort_on_failure,
            allowed_to_fail: step.allowed_to_fail,
            exit_status: 0,
            status: JobStatus::NotStarted,
            complete: false,
            output: String::new(),
            seconds: 0,
            last_modified: Utc::now(),
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.complete = false;
        self.last_modified = Utc::now();
    }

    /// Record the step's exit. Non-zero exits map to `FailedOk` when the
    /// step is allowed to fail.
    pub fn finish(&mut self, exit_status: i32, output: impl Into<String>, seconds: u64) {
        self.exit_status = exit_status;
        self.status = JobStatus::for_exit(exit_status, self.allowed_to_fail);
        self.output = output.into();
        self.seconds = seconds;
        self.complete = true;
        self.last_modified = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Canceled;
        self.complete = true;
        self.last_modified = Utc::now();
    }

    /// A failure that stops the remaining steps of the job.
    pub fn aborts_job(&self) -> bool {
        self.abort_on_failure
            && matches!(
                self.status,
                JobStatus::Failed | JobStatus::FailedOk | JobStatus::Canceled
            )
    }
}
