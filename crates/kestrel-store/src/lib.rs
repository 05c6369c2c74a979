//! In-memory transactional store for Kestrel CI.
//!
//! Every repository shares one state value behind a `tokio` lock, so a
//! single write lock makes a check-and-set (version checks, claims) atomic.

pub mod repositories;

pub use repositories::*;

use kestrel_core::client::BuildClient;
use kestrel_core::event::Event;
use kestrel_core::ids::{ClientId, EventId, JobId, RecipeId};
use kestrel_core::job::Job;
use kestrel_core::ports::{
    AuditEntry, AuditLog, ClientRepository, EventRepository, JobRepository, RecipeRepository,
};
use kestrel_core::recipe::Recipe;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows held by the store.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) recipes: HashMap<RecipeId, Recipe>,
    pub(crate) events: HashMap<EventId, Event>,
    pub(crate) jobs: HashMap<JobId, Job>,
    pub(crate) clients: HashMap<ClientId, BuildClient>,
    pub(crate) audit: Vec<AuditEntry>,
}

pub(crate) type SharedState = Arc<RwLock<StoreState>>;

/// Handle to the store. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: SharedState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipes(&self) -> Arc<dyn RecipeRepository> {
        Arc::new(MemRecipeRepository::new(self.state.clone()))
    }

    pub fn events(&self) -> Arc<dyn EventRepository> {
        Arc::new(MemEventRepository::new(self.state.clone()))
    }

    pub fn jobs(&self) -> Arc<dyn JobRepository> {
        Arc::new(MemJobRepository::new(self.state.clone()))
    }

    pub fn clients(&self) -> Arc<dyn ClientRepository> {
        Arc::new(MemClientRepository::new(self.state.clone()))
    }

    pub fn audit(&self) -> Arc<dyn AuditLog> {
        Arc::new(MemAuditLog::new(self.state.clone()))
    }
}
