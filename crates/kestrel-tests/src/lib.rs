//! Integration test infrastructure for Kestrel CI.
//!
//! Wires the scheduler services to the in-memory store and a recording
//! notifier so scenarios can drive an event from creation to completion.
//!
//! # Usage
//!
//! ```ignore
//! use kestrel_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new();
//!     // Use ctx.store, ctx.aggregator, ctx.cancellation, ctx.notifier, etc.
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;

pub use context::TestContext;
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,kestrel_scheduler=debug,kestrel_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
