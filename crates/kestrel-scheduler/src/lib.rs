//! Job scheduling and orchestration for Kestrel CI.
//!
//! The pure parts (graph, tiers, roll-ups, label matching) are plain
//! functions over domain values. The services (`ReadinessTracker`,
//! `StatusAggregator`, `CancellationCoordinator`) load from and persist to
//! the store ports in `kestrel_core::ports`.

pub mod activation;
pub mod aggregate;
pub mod cancel;
pub mod graph;
pub mod readiness;
pub mod scheduler;

pub use activation::{ActivationMatch, ActivationMatcher};
pub use aggregate::{EventTransition, JobTransition, Rollup, StatusAggregator, StepUpdate};
pub use cancel::{CancelOutcome, CancellationCoordinator};
pub use graph::{GraphError, RecipeGraph, RecipeNode};
pub use readiness::ReadinessTracker;
pub use scheduler::{Invalidation, JobScheduler, ReadinessPlan, SchedulingError};
