//! Build clients that poll for and execute jobs.

use crate::ids::ClientId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// Running a job.
    Running,
    /// Looking for work.
    Idle,
    #[default]
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BuildClient {
    pub id: ClientId,
    pub name: String,
    pub status: ClientStatus,
    #[serde(default)]
    pub status_message: String,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl BuildClient {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ClientId::new(),
            name: name.into(),
            status: ClientStatus::Idle,
            status_message: String::new(),
            last_seen: now,
            created_at: now,
        }
    }

    /// Record that the client checked in with the given status.
    pub fn seen(&mut self, status: ClientStatus, message: impl Into<String>) {
        self.status = status;
        self.status_message = message.into();
        self.last_seen = Utc::now();
    }
}
