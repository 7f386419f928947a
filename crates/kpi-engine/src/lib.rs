//! Indicator governance engine.
//!
//! Decides which indicator values may be written when, moves monthly
//! submissions through DRAFT → SUBMITTED → VALIDATED (or back to DRAFT on
//! rejection), and rolls them up into annual matrices. Time is always passed
//! in by the caller; the engine never reads the system clock.

#![deny(unsafe_code)]

pub mod access;
pub mod audit;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod entry;
pub mod error;
pub mod frequency;
pub mod locks;
pub mod permission;
pub mod rollup;
pub mod store;
pub mod workflow;

pub use access::{CapabilityPolicy, RolePolicy};
pub use audit::{AuditEvent, AuditLog, AuditRecord};
pub use catalog::{
    CatalogSeed, IndicatorSeed, IndicatorUpdate, NewIndicator, NewProcess, ProcessSeed,
    SeedSummary,
};
pub use clock::{
    current_period, is_within_entry_window, Clock, EntryWindow, FixedClock, PeriodClock,
    SystemClock,
};
pub use engine::{GovernanceEngine, SaveItem};
pub use entry::{completion, EntryValue, RecordedValue};
pub use error::{StorageError, StorageResult};
pub use frequency::{due_months, frequency_is_due, is_due, is_due_raw};
pub use locks::KeyedLocks;
pub use permission::{can_edit, check_edit, EditAuthority, EditTarget};
pub use rollup::build_matrix;
pub use store::{
    AuditStore, CatalogStore, GovernanceStore, InMemoryStore, JournalStore, SubmissionStore,
};
pub use workflow::{TransitionContext, WorkflowAction};
