//! Applies readiness plans to the jobs of an event.

use crate::graph::RecipeGraph;
use crate::scheduler::{JobScheduler, ReadinessPlan};
use kestrel_core::ids::{EventId, JobId, RecipeId};
use kestrel_core::job::Job;
use kestrel_core::ports::{AuditLog, JobRepository, RecipeRepository};
use kestrel_core::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Loads an event's jobs and recipe graph from the store and persists the
/// readiness decisions for them.
pub struct ReadinessTracker {
    recipes: Arc<dyn RecipeRepository>,
    jobs: Arc<dyn JobRepository>,
    audit: Arc<dyn AuditLog>,
    scheduler: JobScheduler,
}

impl ReadinessTracker {
    pub fn new(
        recipes: Arc<dyn RecipeRepository>,
        jobs: Arc<dyn JobRepository>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            recipes,
            jobs,
            audit,
            scheduler: JobScheduler::new(),
        }
    }

    /// Build the dependency graph over the recipes of `jobs` and everything
    /// they transitively depend on.
    pub async fn graph_for(&self, jobs: &[Job]) -> Result<RecipeGraph> {
        let mut requested: HashSet<RecipeId> = HashSet::new();
        let mut pending: Vec<RecipeId> = jobs.iter().map(|j| j.recipe_id).collect();
        let mut recipes = Vec::new();

        while !pending.is_empty() {
            pending.retain(|id| requested.insert(*id));
            if pending.is_empty() {
                break;
            }
            let found = self.recipes.get_many(&pending).await?;
            pending = found
                .iter()
                .flat_map(|r| r.dependency_ids())
                .filter(|id| !requested.contains(id))
                .collect();
            recipes.extend(found);
        }

        Ok(RecipeGraph::build(&recipes)?)
    }

    /// Tiers of the event's jobs, as job ids.
    pub async fn tiers(&self, event_id: EventId) -> Result<Vec<Vec<JobId>>> {
        let jobs = self.jobs.list_for_event(event_id).await?;
        let graph = self.graph_for(&jobs).await?;
        let tiers = self.scheduler.schedule(&jobs, &graph)?;
        Ok(tiers
            .into_iter()
            .map(|tier| tier.into_iter().map(|j| j.id).collect())
            .collect())
    }

    /// Mark the next jobs ready and settle the ones that can never run.
    ///
    /// The whole plan is computed before anything is written, so a
    /// scheduling error leaves the event untouched.
    pub async fn advance(&self, event_id: EventId) -> Result<ReadinessPlan> {
        let mut jobs = self.jobs.list_for_event(event_id).await?;
        let graph = self.graph_for(&jobs).await?;
        let plan = self.scheduler.readiness(&jobs, &graph)?;

        if plan.is_empty() {
            debug!(event_id = %event_id, "No readiness changes");
            return Ok(plan);
        }

        for invalidation in &plan.invalidated {
            let job = find(&mut jobs, invalidation.job)?;
            job.invalidate();
            self.jobs.update(job).await?;
            let message = format!(
                "Canceled because upstream job {} finished as {}",
                invalidation.upstream, invalidation.upstream_status
            );
            self.audit.append(job.id, &message).await?;
            info!(
                event_id = %event_id,
                job_id = %job.id,
                upstream = %invalidation.upstream,
                upstream_status = %invalidation.upstream_status,
                "Invalidated job"
            );
        }

        for job_id in &plan.ready {
            let job = find(&mut jobs, *job_id)?;
            job.ready = true;
            self.jobs.update(job).await?;
            info!(event_id = %event_id, job_id = %job.id, recipe = %job.recipe_name, "Job ready");
        }

        Ok(plan)
    }
}

fn find(jobs: &mut [Job], id: JobId) -> Result<&mut Job> {
    jobs.iter_mut()
        .find(|j| j.id == id)
        .ok_or_else(|| Error::JobNotFound(id.to_string()))
}
