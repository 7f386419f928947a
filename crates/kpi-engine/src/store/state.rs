//! Store contents shared by the in-memory and journal backends

use crate::audit::AuditRecord;
use crate::error::{StorageError, StorageResult};
use kpi_types::{
    Indicator, IndicatorId, Process, ProcessId, SubmissionAggregate, SubmissionKey, TenantId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a backend holds. Serialized as-is by the journal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    #[serde(default)]
    processes: BTreeMap<ProcessId, Process>,
    #[serde(default)]
    indicators: BTreeMap<IndicatorId, Indicator>,
    /// Keyed by `SubmissionKey`'s display form, which is unique per key
    #[serde(default)]
    submissions: BTreeMap<String, SubmissionAggregate>,
    #[serde(default)]
    audit: Vec<AuditRecord>,
}

impl StoreState {
    pub fn submission(&self, key: &SubmissionKey) -> Option<&SubmissionAggregate> {
        self.submissions.get(&key.to_string())
    }

    pub fn submissions_for(&self, process_id: &ProcessId, year: i32) -> Vec<SubmissionAggregate> {
        let mut found: Vec<SubmissionAggregate> = self
            .submissions
            .values()
            .filter(|s| s.process_id() == process_id && s.period().year() == year)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.period());
        found
    }

    pub fn save_submission(
        &mut self,
        mut aggregate: SubmissionAggregate,
    ) -> StorageResult<SubmissionAggregate> {
        let slot = aggregate.key.to_string();
        let found = self.submissions.get(&slot).map(|s| s.version).unwrap_or(0);
        if found != aggregate.version {
            return Err(StorageError::VersionConflict {
                key: slot,
                expected: aggregate.version,
                found,
            });
        }
        aggregate.version += 1;
        self.submissions.insert(slot, aggregate.clone());
        Ok(aggregate)
    }

    pub fn process(&self, id: &ProcessId) -> Option<&Process> {
        self.processes.get(id)
    }

    pub fn processes(&self) -> Vec<Process> {
        let mut all: Vec<Process> = self.processes.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    pub fn insert_process(&mut self, process: Process) -> StorageResult<()> {
        if self.processes.contains_key(&process.id) {
            return Err(StorageError::Conflict(format!(
                "process {} already exists",
                process.id
            )));
        }
        let code_taken = self
            .processes
            .values()
            .any(|p| p.tenant_id == process.tenant_id && p.code == process.code);
        if code_taken {
            return Err(StorageError::Conflict(format!(
                "process code {} is already in use",
                process.code
            )));
        }
        self.processes.insert(process.id.clone(), process);
        Ok(())
    }

    pub fn indicator(&self, id: &IndicatorId) -> Option<&Indicator> {
        self.indicators.get(id)
    }

    pub fn indicators(&self, process_id: Option<&ProcessId>) -> Vec<Indicator> {
        let mut all: Vec<Indicator> = self
            .indicators
            .values()
            .filter(|i| process_id.map_or(true, |p| &i.process_id == p))
            .cloned()
            .collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    pub fn insert_indicator(&mut self, indicator: Indicator) -> StorageResult<()> {
        if self.indicators.contains_key(&indicator.id) {
            return Err(StorageError::Conflict(format!(
                "indicator {} already exists",
                indicator.id
            )));
        }
        let tenant = self
            .processes
            .get(&indicator.process_id)
            .map(|p| p.tenant_id.clone())
            .ok_or_else(|| {
                StorageError::Conflict(format!(
                    "owning process {} does not exist",
                    indicator.process_id
                ))
            })?;
        if self.indicator_code_taken(&tenant, &indicator.code) {
            return Err(StorageError::Conflict(format!(
                "indicator code {} is already in use",
                indicator.code
            )));
        }
        self.indicators.insert(indicator.id.clone(), indicator);
        Ok(())
    }

    /// Indicator codes are unique per tenant, across its processes.
    fn indicator_code_taken(&self, tenant: &TenantId, code: &str) -> bool {
        self.indicators.values().any(|i| {
            i.code == code
                && self
                    .processes
                    .get(&i.process_id)
                    .is_some_and(|p| &p.tenant_id == tenant)
        })
    }

    pub fn update_indicator(&mut self, indicator: Indicator) -> StorageResult<()> {
        match self.indicators.get_mut(&indicator.id) {
            Some(slot) => {
                *slot = indicator;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("indicator {}", indicator.id))),
        }
    }

    pub fn audit(&self) -> &[AuditRecord] {
        &self.audit
    }

    pub fn append_audit(&mut self, record: AuditRecord) {
        self.audit.push(record);
    }
}
