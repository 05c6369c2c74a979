//! Tiering of an event's jobs and readiness decisions.

use crate::graph::RecipeGraph;
use kestrel_core::ids::{JobId, RecipeId};
use kestrel_core::job::Job;
use kestrel_core::status::JobStatus;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Job {job} uses recipe {recipe} which is not in the dependency graph")]
    UnknownRecipe { job: JobId, recipe: RecipeId },
    #[error("Dependencies can never be satisfied for recipes: {}", recipes.join(", "))]
    Unsatisfiable { recipes: Vec<String> },
}

impl From<SchedulingError> for kestrel_core::Error {
    fn from(err: SchedulingError) -> Self {
        kestrel_core::Error::Scheduling(err.to_string())
    }
}

/// A job that will never run because an upstream job blocks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidation {
    pub job: JobId,
    pub upstream: JobId,
    pub upstream_status: JobStatus,
}

/// What should change after the current state of an event's jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPlan {
    pub ready: Vec<JobId>,
    pub invalidated: Vec<Invalidation>,
}

impl ReadinessPlan {
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.invalidated.is_empty()
    }
}

/// Orders the jobs of one event by recipe dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobScheduler;

impl JobScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Partition `jobs` into tiers. Every job lands in exactly one tier and
    /// all of its dependency recipes are placed in earlier tiers.
    ///
    /// Within a tier jobs are ordered by recipe priority (highest first),
    /// then display name, build config and job id.
    pub fn schedule<'a>(
        &self,
        jobs: &'a [Job],
        graph: &RecipeGraph,
    ) -> Result<Vec<Vec<&'a Job>>, SchedulingError> {
        for job in jobs {
            if !graph.contains(job.recipe_id) {
                return Err(SchedulingError::UnknownRecipe {
                    job: job.id,
                    recipe: job.recipe_id,
                });
            }
        }

        let mut tiers = Vec::new();
        let mut placed: HashSet<RecipeId> = HashSet::new();
        let mut remaining: Vec<&Job> = jobs.iter().collect();

        while !remaining.is_empty() {
            let (mut tier, rest): (Vec<&Job>, Vec<&Job>) = remaining
                .into_iter()
                .partition(|job| graph.dependency_ids(job.recipe_id).all(|d| placed.contains(&d)));

            if tier.is_empty() {
                let recipes: BTreeSet<String> = rest
                    .iter()
                    .map(|job| job.recipe_name.clone())
                    .collect();
                return Err(SchedulingError::Unsatisfiable {
                    recipes: recipes.into_iter().collect(),
                });
            }

            sort_tier(&mut tier, graph);
            placed.extend(tier.iter().map(|job| job.recipe_id));
            tiers.push(tier);
            remaining = rest;
        }

        debug!(jobs = jobs.len(), tiers = tiers.len(), "Scheduled jobs into tiers");
        Ok(tiers)
    }

    /// Decide which jobs become ready and which are invalidated.
    ///
    /// Tiers are walked in order and a tier is only considered once every
    /// job in the earlier tiers is complete. Invalidations made during the
    /// walk count as complete, so they cascade into later tiers.
    pub fn readiness(&self, jobs: &[Job], graph: &RecipeGraph) -> Result<ReadinessPlan, SchedulingError> {
        let tiers = self.schedule(jobs, graph)?;

        let mut state: HashMap<JobId, (JobStatus, bool)> =
            jobs.iter().map(|j| (j.id, (j.status, j.complete))).collect();
        let mut by_recipe: HashMap<RecipeId, Vec<JobId>> = HashMap::new();
        for job in jobs {
            by_recipe.entry(job.recipe_id).or_default().push(job.id);
        }

        let mut plan = ReadinessPlan::default();

        for tier in &tiers {
            for job in tier {
                if job.complete || job.ready || job.invalidated {
                    continue;
                }

                if let Some((upstream, upstream_status)) =
                    blocking_upstream(job, graph, &by_recipe, &state)
                {
                    state.insert(job.id, (JobStatus::Canceled, true));
                    plan.invalidated.push(Invalidation {
                        job: job.id,
                        upstream,
                        upstream_status,
                    });
                } else if job.active {
                    plan.ready.push(job.id);
                }
            }

            let tier_complete = tier
                .iter()
                .all(|job| state.get(&job.id).is_some_and(|(_, complete)| *complete));
            if !tier_complete {
                break;
            }
        }

        Ok(plan)
    }
}

fn sort_tier(tier: &mut [&Job], graph: &RecipeGraph) {
    tier.sort_by(|a, b| {
        let key = |job: &Job| {
            let node = graph.get(job.recipe_id);
            (
                Reverse(node.map(|n| n.priority).unwrap_or_default()),
                node.map(|n| n.display_name.clone()).unwrap_or_default(),
                job.config.clone(),
                job.id,
            )
        };
        key(*a).cmp(&key(*b))
    });
}

/// First upstream job that prevents `job` from ever running.
fn blocking_upstream(
    job: &Job,
    graph: &RecipeGraph,
    by_recipe: &HashMap<RecipeId, Vec<JobId>>,
    state: &HashMap<JobId, (JobStatus, bool)>,
) -> Option<(JobId, JobStatus)> {
    for (dependency, abort_on_failure) in graph.dependencies(job.recipe_id) {
        let upstream_jobs = by_recipe.get(&dependency.id).map(Vec::as_slice).unwrap_or_default();
        for upstream in upstream_jobs {
            let Some(&(status, _)) = state.get(upstream) else {
                continue;
            };
            let blocks = match status {
                JobStatus::Canceled => true,
                JobStatus::Failed => abort_on_failure,
                _ => false,
            };
            if blocks {
                return Some((*upstream, status));
            }
        }
    }
    None
}
