//! Commit status reporting for Kestrel CI.
//!
//! Implements the remote status contract of `kestrel_core::ports` on top
//! of the git host registry.

pub mod sender;

pub use sender::{CommitStatusNotifier, commit_state, status_context};
