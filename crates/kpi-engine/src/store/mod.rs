//! Storage layer for the governance engine
//!
//! Provides storage for the catalog, submissions and the audit chain.

mod journal;
mod memory;
mod state;
mod traits;

pub use journal::JournalStore;
pub use memory::InMemoryStore;
pub use traits::{AuditStore, CatalogStore, GovernanceStore, SubmissionStore};
