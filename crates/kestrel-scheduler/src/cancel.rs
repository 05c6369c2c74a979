//! Event cancellation.

use kestrel_core::ids::{EventId, JobId};
use kestrel_core::ports::{AuditLog, EventRepository, JobRepository, NotifyContext};
use kestrel_core::status::JobStatus;
use kestrel_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelOutcome {
    /// Jobs canceled by this call.
    pub canceled: Vec<JobId>,
    /// Whether the event itself was written.
    pub event_updated: bool,
}

/// Cancels every outstanding job of an event.
pub struct CancellationCoordinator {
    events: Arc<dyn EventRepository>,
    jobs: Arc<dyn JobRepository>,
    audit: Arc<dyn AuditLog>,
}

impl CancellationCoordinator {
    pub fn new(
        events: Arc<dyn EventRepository>,
        jobs: Arc<dyn JobRepository>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self { events, jobs, audit }
    }

    /// Cancel the incomplete jobs of an event and mark the event canceled.
    ///
    /// Calling this again on an event that is already canceled and has no
    /// outstanding jobs succeeds without writing or notifying anything.
    pub async fn cancel_event(
        &self,
        event_id: EventId,
        message: &str,
        notify: Option<&NotifyContext>,
    ) -> Result<CancelOutcome> {
        let mut event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| Error::EventNotFound(event_id.to_string()))?;
        let mut jobs = self.jobs.list_for_event(event_id).await?;

        let mut outcome = CancelOutcome::default();
        for job in jobs.iter_mut().filter(|j| !j.complete) {
            job.cancel();
            self.jobs.update(job).await?;
            self.audit.append(job.id, message).await?;
            outcome.canceled.push(job.id);
            info!(event_id = %event_id, job_id = %job.id, recipe = %job.recipe_name, "Canceled job");

            if let Some(notify) = notify {
                notify.job_canceled(job, &event).await;
            }
        }

        if event.complete && event.status == JobStatus::Canceled && outcome.canceled.is_empty() {
            debug!(event_id = %event_id, "Event already canceled");
            return Ok(outcome);
        }

        event.complete = true;
        event.status = JobStatus::Canceled;
        event.last_modified = chrono::Utc::now();
        self.events.update(&mut event).await?;
        outcome.event_updated = true;
        info!(event_id = %event_id, jobs = outcome.canceled.len(), "Canceled event");

        if let Some(notify) = notify {
            notify.event_complete(&event, &jobs).await;
        }

        Ok(outcome)
    }
}
