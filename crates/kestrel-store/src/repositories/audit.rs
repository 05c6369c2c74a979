//! In-memory job change log.

use crate::SharedState;
use async_trait::async_trait;
use chrono::Utc;
use kestrel_core::ids::JobId;
use kestrel_core::ports::{AuditEntry, AuditLog};
use kestrel_core::Result;

pub struct MemAuditLog {
    state: SharedState,
}

impl MemAuditLog {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl AuditLog for MemAuditLog {
    async fn append(&self, job_id: JobId, message: &str) -> Result<()> {
        self.state.write().await.audit.push(AuditEntry {
            job_id,
            message: message.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn entries(&self, job_id: JobId) -> Result<Vec<AuditEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect())
    }
}
