//! In-memory storage implementation

use super::state::StoreState;
use super::traits::*;
use crate::audit::AuditRecord;
use crate::error::StorageResult;
use async_trait::async_trait;
use kpi_types::{Indicator, IndicatorId, Process, ProcessId, SubmissionAggregate, SubmissionKey};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn get_submission(
        &self,
        key: &SubmissionKey,
    ) -> StorageResult<Option<SubmissionAggregate>> {
        Ok(self.state.read().await.submission(key).cloned())
    }

    async fn list_submissions(
        &self,
        process_id: &ProcessId,
        year: i32,
    ) -> StorageResult<Vec<SubmissionAggregate>> {
        Ok(self.state.read().await.submissions_for(process_id, year))
    }

    async fn save_submission(
        &self,
        aggregate: SubmissionAggregate,
    ) -> StorageResult<SubmissionAggregate> {
        self.state.write().await.save_submission(aggregate)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_process(&self, id: &ProcessId) -> StorageResult<Option<Process>> {
        Ok(self.state.read().await.process(id).cloned())
    }

    async fn list_processes(&self) -> StorageResult<Vec<Process>> {
        Ok(self.state.read().await.processes())
    }

    async fn insert_process(&self, process: Process) -> StorageResult<()> {
        self.state.write().await.insert_process(process)
    }

    async fn get_indicator(&self, id: &IndicatorId) -> StorageResult<Option<Indicator>> {
        Ok(self.state.read().await.indicator(id).cloned())
    }

    async fn list_indicators(
        &self,
        process_id: Option<&ProcessId>,
    ) -> StorageResult<Vec<Indicator>> {
        Ok(self.state.read().await.indicators(process_id))
    }

    async fn insert_indicator(&self, indicator: Indicator) -> StorageResult<()> {
        self.state.write().await.insert_indicator(indicator)
    }

    async fn update_indicator(&self, indicator: Indicator) -> StorageResult<()> {
        self.state.write().await.update_indicator(indicator)
    }
}

#[async_trait]
impl AuditStore for InMemoryStore {
    async fn load_audit(&self) -> StorageResult<Vec<AuditRecord>> {
        Ok(self.state.read().await.audit().to_vec())
    }

    async fn append_audit(&self, record: AuditRecord) -> StorageResult<()> {
        self.state.write().await.append_audit(record);
        Ok(())
    }
}
