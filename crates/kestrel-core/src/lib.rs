//! Kestrel CI Core
//!
//! Core domain types, traits, and error handling for Kestrel CI.
//! This crate has minimal dependencies and defines the shared vocabulary
//! (statuses, recipes, jobs, events, store ports) used by the scheduler,
//! the store and the notifiers.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod githost;
pub mod ids;
pub mod job;
pub mod ports;
pub mod recipe;
pub mod status;

pub use error::{Error, Result};
pub use ids::*;
pub use status::JobStatus;
