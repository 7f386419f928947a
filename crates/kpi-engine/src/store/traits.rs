//! Storage trait definitions

use crate::audit::AuditRecord;
use crate::error::StorageResult;
use async_trait::async_trait;
use kpi_types::{Indicator, IndicatorId, Process, ProcessId, SubmissionAggregate, SubmissionKey};

/// Combined storage trait
pub trait GovernanceStore:
    SubmissionStore + CatalogStore + AuditStore + Send + Sync + std::fmt::Debug
{
}

impl<T> GovernanceStore for T where
    T: SubmissionStore + CatalogStore + AuditStore + Send + Sync + std::fmt::Debug
{
}

/// Storage for submission aggregates
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Get the submission of a (process, period)
    async fn get_submission(&self, key: &SubmissionKey)
        -> StorageResult<Option<SubmissionAggregate>>;

    /// List the submissions of a process for a year, oldest period first
    async fn list_submissions(
        &self,
        process_id: &ProcessId,
        year: i32,
    ) -> StorageResult<Vec<SubmissionAggregate>>;

    /// Compare-and-swap save.
    ///
    /// `aggregate.version` must equal the stored version (0 when absent).
    /// Returns the stored aggregate, whose version is one higher.
    async fn save_submission(
        &self,
        aggregate: SubmissionAggregate,
    ) -> StorageResult<SubmissionAggregate>;
}

/// Storage for the indicator catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_process(&self, id: &ProcessId) -> StorageResult<Option<Process>>;

    /// All processes ordered by code
    async fn list_processes(&self) -> StorageResult<Vec<Process>>;

    /// Insert a process; fails with `Conflict` if the id, or the code within
    /// the tenant, is taken
    async fn insert_process(&self, process: Process) -> StorageResult<()>;

    async fn get_indicator(&self, id: &IndicatorId) -> StorageResult<Option<Indicator>>;

    /// Indicators ordered by code, optionally restricted to one process
    async fn list_indicators(&self, process_id: Option<&ProcessId>)
        -> StorageResult<Vec<Indicator>>;

    /// Insert an indicator; fails with `Conflict` if the id is taken, the code
    /// is in use by the tenant, or the owning process is unknown
    async fn insert_indicator(&self, indicator: Indicator) -> StorageResult<()>;

    /// Replace an existing indicator; fails with `NotFound` if absent
    async fn update_indicator(&self, indicator: Indicator) -> StorageResult<()>;
}

/// Storage for the audit chain
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Every persisted record, in chain order
    async fn load_audit(&self) -> StorageResult<Vec<AuditRecord>>;

    async fn append_audit(&self, record: AuditRecord) -> StorageResult<()>;
}
