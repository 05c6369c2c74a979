//! Test context wiring the scheduler services to an in-memory store.

use crate::fixtures::EventFixture;
use crate::helpers::RecordingNotifier;
use anyhow::Context as _;
use kestrel_core::client::BuildClient;
use kestrel_core::event::Event;
use kestrel_core::ids::{ClientId, EventId, JobId};
use kestrel_core::job::Job;
use kestrel_core::ports::{NotifyContext, RemoteStatusNotifier};
use kestrel_core::recipe::Recipe;
use kestrel_scheduler::{
    CancellationCoordinator, JobTransition, ReadinessTracker, StatusAggregator, StepUpdate,
};
use kestrel_store::MemoryStore;
use std::sync::Arc;

pub const BASE_URL: &str = "https://ci.example.com";

/// Services sharing one store, reporting to a [`RecordingNotifier`].
pub struct TestContext {
    pub store: MemoryStore,
    pub readiness: Arc<ReadinessTracker>,
    pub aggregator: StatusAggregator,
    pub cancellation: CancellationCoordinator,
    pub notifier: Arc<RecordingNotifier>,
    pub notify: NotifyContext,
}

impl TestContext {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_recorder(Arc::new(RecordingNotifier::new()))
    }

    /// Context whose notifier fails every call.
    pub fn failing_notifier() -> anyhow::Result<Self> {
        Self::with_recorder(Arc::new(RecordingNotifier::failing()))
    }

    /// Context reporting to an arbitrary notifier. The recorder stays empty.
    pub fn with_notifier(notifier: Arc<dyn RemoteStatusNotifier>) -> anyhow::Result<Self> {
        let mut ctx = Self::new()?;
        ctx.notify = NotifyContext::new(notifier, BASE_URL)?;
        ctx.aggregator = ctx.build_aggregator();
        Ok(ctx)
    }

    fn with_recorder(notifier: Arc<RecordingNotifier>) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let store = MemoryStore::new();
        let readiness = Arc::new(ReadinessTracker::new(
            store.recipes(),
            store.jobs(),
            store.audit(),
        ));
        let notify = NotifyContext::new(notifier.clone(), BASE_URL)?;
        let aggregator = StatusAggregator::new(store.events(), store.jobs(), readiness.clone())
            .with_notifier(notify.clone());
        let cancellation = CancellationCoordinator::new(store.events(), store.jobs(), store.audit());

        Ok(Self {
            store,
            readiness,
            aggregator,
            cancellation,
            notifier,
            notify,
        })
    }

    fn build_aggregator(&self) -> StatusAggregator {
        StatusAggregator::new(self.store.events(), self.store.jobs(), self.readiness.clone())
            .with_notifier(self.notify.clone())
    }

    /// Store the recipes, create a pull request event with one `linux` job
    /// per recipe and make the first tier ready.
    pub async fn create_event(&self, recipes: &[Recipe]) -> anyhow::Result<Event> {
        self.create_event_from(EventFixture::pull_request(7), recipes)
            .await
    }

    pub async fn create_event_from(&self, event: Event, recipes: &[Recipe]) -> anyhow::Result<Event> {
        for recipe in recipes {
            if self.store.recipes().get(recipe.id).await?.is_none() {
                self.store.recipes().create(recipe).await?;
            }
        }
        self.store.events().create(&event).await?;
        for recipe in recipes {
            let job = Job::for_recipe(recipe, event.id, "linux");
            self.store.jobs().create(&job).await?;
        }
        self.readiness.advance(event.id).await?;
        self.event(event.id).await
    }

    pub async fn event(&self, id: EventId) -> anyhow::Result<Event> {
        self.store
            .events()
            .get(id)
            .await?
            .with_context(|| format!("event {id} missing"))
    }

    pub async fn job(&self, id: JobId) -> anyhow::Result<Job> {
        self.store
            .jobs()
            .get(id)
            .await?
            .with_context(|| format!("job {id} missing"))
    }

    /// The job of an event instantiated from the named recipe.
    pub async fn job_for(&self, event_id: EventId, recipe: &str) -> anyhow::Result<Job> {
        self.store
            .jobs()
            .list_for_event(event_id)
            .await?
            .into_iter()
            .find(|j| j.recipe_name == recipe)
            .with_context(|| format!("no {recipe} job on event {event_id}"))
    }

    pub async fn register_client(&self, name: &str) -> anyhow::Result<ClientId> {
        Ok(self.store.clients().register(&BuildClient::new(name)).await?)
    }

    /// Claim a job and run its steps with the given exit statuses, in
    /// position order. Returns the transition of the last step.
    pub async fn run_job(&self, job_id: JobId, exits: &[i32]) -> anyhow::Result<JobTransition> {
        let client = self.register_client("runner").await?;
        let job = self.store.jobs().claim(job_id, client).await?;

        let mut last = None;
        for (step, exit) in job.step_results.iter().zip(exits) {
            self.aggregator
                .start_step(job_id, step.position, client)
                .await?;
            let update = StepUpdate::new(step.position, *exit)
                .with_output(format!("exit {exit}"))
                .with_seconds(1);
            let transition = self.aggregator.record_step(job_id, client, update).await?;
            let done = transition.completed;
            last = Some(transition);
            if done {
                break;
            }
        }
        last.context("job has no steps to run")
    }
}
