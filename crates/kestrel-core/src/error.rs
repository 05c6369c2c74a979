//! Error types for Kestrel CI.

use crate::githost::GitServerKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Lookup errors
    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Build client not found: {0}")]
    ClientNotFound(String),

    #[error("Step {position} not found on job {job}")]
    StepNotFound { job: String, position: u32 },

    // State machine errors
    #[error("Job already complete: {0}")]
    JobAlreadyComplete(String),

    #[error("Job is not claimable: {0}")]
    NotClaimable(String),

    #[error("Scheduling failed: {0}")]
    Scheduling(String),

    // Concurrency
    #[error("Concurrent update conflict on {entity} {id}")]
    Conflict { entity: &'static str, id: String },

    // Configuration
    #[error("Unsupported git server: {0}")]
    UnsupportedServer(GitServerKind),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Infrastructure errors
    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the caller may retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
