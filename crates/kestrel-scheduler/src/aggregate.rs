//! Step to job to event status roll-up.

use crate::readiness::ReadinessTracker;
use kestrel_core::ids::{ClientId, EventId, JobId};
use kestrel_core::job::{Job, StepResult};
use kestrel_core::ports::{EventRepository, JobRepository, NotifyContext};
use kestrel_core::status::JobStatus;
use kestrel_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Status and completion derived from a set of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollup {
    pub status: JobStatus,
    pub complete: bool,
}

impl Rollup {
    const EMPTY: Rollup = Rollup {
        status: JobStatus::NotStarted,
        complete: false,
    };
}

/// Roll the step results of a job up into the job's status.
///
/// Steps are walked in position order. Steps that have not started are
/// skipped, and a step that aborts the job stops the walk and completes
/// the job.
pub fn rollup_job(steps: &[StepResult]) -> Rollup {
    if steps.is_empty() {
        return Rollup::EMPTY;
    }

    let mut ordered: Vec<&StepResult> = steps.iter().collect();
    ordered.sort_by_key(|s| s.position);

    let mut status = JobStatus::NotStarted;
    let mut all_terminal = true;
    for step in ordered {
        if step.status == JobStatus::NotStarted {
            all_terminal = false;
            continue;
        }
        status = status.max(step.status);
        if !step.status.is_terminal() {
            all_terminal = false;
        }
        if step.aborts_job() {
            return Rollup {
                status,
                complete: true,
            };
        }
    }

    Rollup {
        status,
        complete: all_terminal,
    }
}

/// Roll the jobs of an event up into the event's status.
///
/// Invalidated jobs count towards completion but not towards the status,
/// so an event keeps the outcome of the job that blocked them.
pub fn rollup_event(jobs: &[Job]) -> Rollup {
    let counted = jobs.iter().filter(|j| !j.invalidated).map(|j| j.status);
    let status = JobStatus::worst(counted).or_else(|| JobStatus::worst(jobs.iter().map(|j| j.status)));
    match status {
        Some(status) => Rollup {
            status,
            complete: jobs.iter().all(Job::is_settled),
        },
        None => Rollup::EMPTY,
    }
}

/// Outcome of one step as reported by a build client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpdate {
    pub position: u32,
    pub exit_status: i32,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub seconds: u64,
}

impl StepUpdate {
    pub fn new(position: u32, exit_status: i32) -> Self {
        Self {
            position,
            exit_status,
            output: String::new(),
            seconds: 0,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_seconds(mut self, seconds: u64) -> Self {
        self.seconds = seconds;
        self
    }
}

/// Result of writing to a job.
#[derive(Debug, Clone)]
pub struct JobTransition {
    pub job: Job,
    /// This write completed the job.
    pub completed: bool,
    pub event: EventTransition,
}

/// Result of recomputing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTransition {
    pub status: JobStatus,
    pub complete: bool,
    /// This call flipped the event to complete.
    pub completed: bool,
}

/// Applies client step reports and keeps jobs and events consistent.
pub struct StatusAggregator {
    events: Arc<dyn EventRepository>,
    jobs: Arc<dyn JobRepository>,
    readiness: Arc<ReadinessTracker>,
    notify: Option<NotifyContext>,
}

impl StatusAggregator {
    pub fn new(
        events: Arc<dyn EventRepository>,
        jobs: Arc<dyn JobRepository>,
        readiness: Arc<ReadinessTracker>,
    ) -> Self {
        Self {
            events,
            jobs,
            readiness,
            notify: None,
        }
    }

    pub fn with_notifier(mut self, notify: NotifyContext) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Mark a step of a claimed job as running.
    ///
    /// Only the client holding the claim may start steps; jobs are claimed
    /// through [`JobRepository::claim`], which enforces readiness.
    pub async fn start_step(
        &self,
        job_id: JobId,
        position: u32,
        client: ClientId,
    ) -> Result<JobTransition> {
        let mut job = self.load_claimed_job(job_id, client).await?;

        step_mut(&mut job, position)?.start();
        let rollup = rollup_job(&job.step_results);
        job.status = rollup.status;
        job.last_modified = chrono::Utc::now();
        self.jobs.update(&mut job).await?;
        debug!(job_id = %job.id, position, client = %client, "Step started");

        let event = self.refresh_event(job.event_id).await?;

        if let Some(notify) = &self.notify {
            if let (Some(step), Some(ev)) = (job.step(position), self.events.get(job.event_id).await?) {
                notify.step_started(step, &job, &ev).await;
            }
        }

        Ok(JobTransition {
            job,
            completed: false,
            event,
        })
    }

    /// Record the outcome of a step.
    ///
    /// Writes to a job that is already complete are rejected, which is how
    /// late reports from a client racing a cancellation are dropped. When the
    /// write completes the job, readiness of the event is advanced before the
    /// event is recomputed. A `Conflict` from the event refresh leaves the
    /// job write in place; call [`StatusAggregator::refresh_event`] to retry.
    pub async fn record_step(
        &self,
        job_id: JobId,
        client: ClientId,
        update: StepUpdate,
    ) -> Result<JobTransition> {
        let mut job = self.load_claimed_job(job_id, client).await?;

        step_mut(&mut job, update.position)?.finish(
            update.exit_status,
            update.output,
            update.seconds,
        );

        let rollup = rollup_job(&job.step_results);
        job.status = rollup.status;
        if rollup.complete {
            job.complete = true;
            job.ready = false;
            job.seconds = job.step_results.iter().map(|s| s.seconds).sum();
        }
        job.last_modified = chrono::Utc::now();
        self.jobs.update(&mut job).await?;

        if rollup.complete {
            info!(
                job_id = %job.id,
                event_id = %job.event_id,
                status = %job.status,
                "Job complete"
            );
            self.readiness.advance(job.event_id).await?;
        } else {
            debug!(
                job_id = %job.id,
                position = update.position,
                exit_status = update.exit_status,
                "Step recorded"
            );
        }

        let event = self.refresh_event(job.event_id).await?;
        Ok(JobTransition {
            job,
            completed: rollup.complete,
            event,
        })
    }

    /// Recompute an event from its jobs.
    ///
    /// Only the caller whose write flips the event to complete reports it.
    /// A complete event is never recomputed.
    pub async fn refresh_event(&self, event_id: EventId) -> Result<EventTransition> {
        let mut event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| Error::EventNotFound(event_id.to_string()))?;

        if event.complete {
            return Ok(EventTransition {
                status: event.status,
                complete: true,
                completed: false,
            });
        }

        let jobs = self.jobs.list_for_event(event_id).await?;
        let rollup = rollup_event(&jobs);
        if rollup.status == event.status && !rollup.complete {
            return Ok(EventTransition {
                status: event.status,
                complete: false,
                completed: false,
            });
        }

        event.status = rollup.status;
        event.complete = rollup.complete;
        event.last_modified = chrono::Utc::now();
        self.events.update(&mut event).await?;

        if rollup.complete {
            info!(event_id = %event.id, status = %event.status, "Event complete");
            if let Some(notify) = &self.notify {
                notify.event_complete(&event, &jobs).await;
            }
        } else {
            debug!(event_id = %event.id, status = %event.status, "Event status changed");
        }

        Ok(EventTransition {
            status: event.status,
            complete: event.complete,
            completed: rollup.complete,
        })
    }

    async fn load_claimed_job(&self, job_id: JobId, client: ClientId) -> Result<Job> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
        if job.complete {
            return Err(Error::JobAlreadyComplete(job_id.to_string()));
        }
        if job.client != Some(client) {
            debug!(job_id = %job_id, client = %client, "Step write from a client without the claim");
            return Err(Error::NotClaimable(job_id.to_string()));
        }
        Ok(job)
    }
}

fn step_mut(job: &mut Job, position: u32) -> Result<&mut StepResult> {
    let job_id = job.id;
    job.step_mut(position).ok_or_else(|| Error::StepNotFound {
        job: job_id.to_string(),
        position,
    })
}
