//! In-memory implementation of EventRepository.

use crate::SharedState;
use async_trait::async_trait;
use kestrel_core::event::Event;
use kestrel_core::ids::EventId;
use kestrel_core::ports::EventRepository;
use kestrel_core::{Error, Result};
use tracing::debug;

pub struct MemEventRepository {
    state: SharedState,
}

impl MemEventRepository {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventRepository for MemEventRepository {
    async fn create(&self, event: &Event) -> Result<EventId> {
        let mut state = self.state.write().await;
        if state.events.contains_key(&event.id) {
            return Err(Error::Conflict {
                entity: "event",
                id: event.id.to_string(),
            });
        }
        state.events.insert(event.id, event.clone());
        debug!(event_id = %event.id, cause = %event.cause_str(), "Stored event");
        Ok(event.id)
    }

    async fn get(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.state.read().await.events.get(&id).cloned())
    }

    async fn update(&self, event: &mut Event) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .events
            .get_mut(&event.id)
            .ok_or_else(|| Error::EventNotFound(event.id.to_string()))?;
        if stored.version != event.version {
            debug!(
                event_id = %event.id,
                stored = stored.version,
                given = event.version,
                "Stale event write"
            );
            return Err(Error::Conflict {
                entity: "event",
                id: event.id.to_string(),
            });
        }
        event.version += 1;
        *stored = event.clone();
        Ok(())
    }
}
