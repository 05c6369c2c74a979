//! Repository implementations over the shared in-memory state.

mod audit;
mod client;
mod event;
mod job;
mod recipe;

pub use audit::MemAuditLog;
pub use client::MemClientRepository;
pub use event::MemEventRepository;
pub use job::MemJobRepository;
pub use recipe::MemRecipeRepository;
