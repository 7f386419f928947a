//! File-backed journal storage
//!
//! The whole store is one JSON document rewritten after every mutation
//! (temp file, then rename), so the file on disk is always a complete
//! snapshot. A mutation that fails to persist is not applied in memory.

use super::state::StoreState;
use super::traits::*;
use crate::audit::AuditRecord;
use crate::error::StorageResult;
use async_trait::async_trait;
use kpi_types::{Indicator, IndicatorId, Process, ProcessId, SubmissionAggregate, SubmissionKey};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

/// JSON journal store
#[derive(Debug)]
pub struct JournalStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl JournalStore {
    /// Open the journal at `path`, loading its contents if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let state = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => StoreState::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "Opened journal store");
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the state, persist it, then swap it in.
    async fn mutate<T, F>(&self, change: F) -> StorageResult<T>
    where
        F: FnOnce(&mut StoreState) -> StorageResult<T> + Send,
        T: Send,
    {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn persist(&self, state: &StoreState) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for JournalStore {
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
        self.mutate(move |s| s.save_submission(aggregate)).await
    }
}

#[async_trait]
impl CatalogStore for JournalStore {
    async fn get_process(&self, id: &ProcessId) -> StorageResult<Option<Process>> {
        Ok(self.state.read().await.process(id).cloned())
    }

    async fn list_processes(&self) -> StorageResult<Vec<Process>> {
        Ok(self.state.read().await.processes())
    }

    async fn insert_process(&self, process: Process) -> StorageResult<()> {
        self.mutate(move |s| s.insert_process(process)).await
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
        self.mutate(move |s| s.insert_indicator(indicator)).await
    }

    async fn update_indicator(&self, indicator: Indicator) -> StorageResult<()> {
        self.mutate(move |s| s.update_indicator(indicator)).await
    }
}

#[async_trait]
impl AuditStore for JournalStore {
    async fn load_audit(&self) -> StorageResult<Vec<AuditRecord>> {
        Ok(self.state.read().await.audit().to_vec())
    }

    async fn append_audit(&self, record: AuditRecord) -> StorageResult<()> {
        self.mutate(move |s| {
            s.append_audit(record);
            Ok(())
        })
        .await
    }
}
