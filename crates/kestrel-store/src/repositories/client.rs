//! In-memory implementation of ClientRepository.

use crate::SharedState;
use async_trait::async_trait;
use kestrel_core::client::BuildClient;
use kestrel_core::ids::ClientId;
use kestrel_core::ports::ClientRepository;
use kestrel_core::{Error, Result};
use tracing::info;

pub struct MemClientRepository {
    state: SharedState,
}

impl MemClientRepository {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ClientRepository for MemClientRepository {
    async fn register(&self, client: &BuildClient) -> Result<ClientId> {
        let mut state = self.state.write().await;
        state.clients.insert(client.id, client.clone());
        info!(client_id = %client.id, name = %client.name, "Registered build client");
        Ok(client.id)
    }

    async fn get(&self, id: ClientId) -> Result<Option<BuildClient>> {
        Ok(self.state.read().await.clients.get(&id).cloned())
    }

    async fn update(&self, client: &BuildClient) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .clients
            .get_mut(&client.id)
            .ok_or_else(|| Error::ClientNotFound(client.id.to_string()))?;
        *stored = client.clone();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<BuildClient>> {
        let state = self.state.read().await;
        let mut clients: Vec<BuildClient> = state.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }
}
