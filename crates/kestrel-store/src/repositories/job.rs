//! In-memory implementation of JobRepository.

use crate::SharedState;
use async_trait::async_trait;
use chrono::Utc;
use kestrel_core::ids::{ClientId, EventId, JobId};
use kestrel_core::job::Job;
use kestrel_core::ports::JobRepository;
use kestrel_core::{Error, Result};
use std::cmp::Reverse;
use tracing::{debug, info};

pub struct MemJobRepository {
    state: SharedState,
}

impl MemJobRepository {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl JobRepository for MemJobRepository {
    async fn create(&self, job: &Job) -> Result<JobId> {
        let mut state = self.state.write().await;
        if state.jobs.contains_key(&job.id) {
            return Err(Error::Conflict {
                entity: "job",
                id: job.id.to_string(),
            });
        }
        state.jobs.insert(job.id, job.clone());
        debug!(job_id = %job.id, event_id = %job.event_id, recipe = %job.recipe_name, "Stored job");
        Ok(job.id)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.state.read().await.jobs.get(&id).cloned())
    }

    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| j.event_id == event_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| (j.created_at, j.id));
        Ok(jobs)
    }

    async fn update(&self, job: &mut Job) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| Error::JobNotFound(job.id.to_string()))?;
        if stored.version != job.version {
            debug!(
                job_id = %job.id,
                stored = stored.version,
                given = job.version,
                "Stale job write"
            );
            return Err(Error::Conflict {
                entity: "job",
                id: job.id.to_string(),
            });
        }
        job.version += 1;
        *stored = job.clone();
        Ok(())
    }

    async fn claim(&self, id: JobId, client: ClientId) -> Result<Job> {
        let mut state = self.state.write().await;
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or_else(|| Error::JobNotFound(id.to_string()))?;
        if !job.is_claimable() {
            return Err(Error::NotClaimable(id.to_string()));
        }
        job.client = Some(client);
        job.version += 1;
        job.last_modified = Utc::now();
        info!(job_id = %id, client_id = %client, "Job claimed");
        Ok(job.clone())
    }

    async fn list_claimable(&self, configs: &[String], limit: usize) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut jobs: Vec<(i32, &Job)> = state
            .jobs
            .values()
            .filter(|j| j.is_claimable() && configs.contains(&j.config))
            .map(|j| {
                let priority = state
                    .recipes
                    .get(&j.recipe_id)
                    .map(|r| r.priority)
                    .unwrap_or_default();
                (priority, j)
            })
            .collect();
        jobs.sort_by_key(|(priority, j)| (Reverse(*priority), j.created_at, j.id));
        Ok(jobs
            .into_iter()
            .take(limit)
            .map(|(_, j)| j.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::MemoryStore;
    use futures::future::join_all;
    use kestrel_core::ids::{ClientId, EventId};
    use kestrel_core::job::Job;
    use kestrel_core::recipe::Recipe;
    use kestrel_core::Error;
    use pretty_assertions::assert_eq;

    async fn ready_job(store: &MemoryStore, recipe: &Recipe, config: &str) -> Job {
        let mut job = Job::for_recipe(recipe, EventId::new(), config);
        job.ready = true;
        store.jobs().create(&job).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_stale_write_conflicts() {
        let store = MemoryStore::new();
        let recipe = Recipe::new("build", "Build");
        let job = ready_job(&store, &recipe, "linux").await;
        let jobs = store.jobs();

        let mut first = jobs.get(job.id).await.unwrap().unwrap();
        let mut second = first.clone();

        first.seconds = 10;
        jobs.update(&mut first).await.unwrap();
        assert_eq!(first.version, 1);

        second.seconds = 20;
        let err = jobs.update(&mut second).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { entity: "job", .. }));
        assert!(err.is_retryable());
        assert_eq!(jobs.get(job.id).await.unwrap().unwrap().seconds, 10);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let store = MemoryStore::new();
        let recipe = Recipe::new("build", "Build");
        let job = ready_job(&store, &recipe, "linux").await;
        let jobs = store.jobs();
        let job_id = job.id;

        let attempts = (0..8).map(|_| {
            let jobs = jobs.clone();
            tokio::spawn(async move { jobs.claim(job_id, ClientId::new()).await })
        });
        let results = join_all(attempts).await;

        let won = results
            .iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        assert_eq!(won, 1);
        for result in results {
            if let Ok(Err(e)) = result {
                assert!(matches!(e, Error::NotClaimable(_)));
            }
        }
    }

    #[tokio::test]
    async fn test_claim_requires_ready() {
        let store = MemoryStore::new();
        let recipe = Recipe::new("build", "Build");
        let job = Job::for_recipe(&recipe, EventId::new(), "linux");
        store.jobs().create(&job).await.unwrap();

        let err = store.jobs().claim(job.id, ClientId::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotClaimable(_)));
    }

    #[tokio::test]
    async fn test_list_claimable_by_priority_and_config() {
        let store = MemoryStore::new();
        let low = Recipe::new("low", "Low").with_priority(1);
        let high = Recipe::new("high", "High").with_priority(50);
        store.recipes().create(&low).await.unwrap();
        store.recipes().create(&high).await.unwrap();

        let low_job = ready_job(&store, &low, "linux").await;
        let high_job = ready_job(&store, &high, "linux").await;
        ready_job(&store, &high, "mac").await;

        let claimable = store
            .jobs()
            .list_claimable(&["linux".to_string()], 10)
            .await
            .unwrap();
        let ids: Vec<_> = claimable.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![high_job.id, low_job.id]);

        let limited = store
            .jobs()
            .list_claimable(&["linux".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }
}
