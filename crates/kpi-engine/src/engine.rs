//! The governance engine: catalog, value writes, workflow and read models
//!
//! Every operation that touches a submission runs under the per-key lock of
//! that submission and saves with compare-and-swap, so a value write can
//! never interleave with a status transition. Reads take no lock.

use crate::access::CapabilityPolicy;
use crate::audit::{AuditEvent, AuditLog, AuditRecord};
use crate::catalog::{CatalogSeed, IndicatorUpdate, NewIndicator, NewProcess, SeedSummary};
use crate::clock::PeriodClock;
use crate::entry::{self, EntryValue};
use crate::error::StorageError;
use crate::frequency::is_due;
use crate::locks::KeyedLocks;
use crate::permission::{can_edit, EditTarget};
use crate::rollup::build_matrix;
use crate::store::GovernanceStore;
use crate::workflow::{self, TransitionContext, WorkflowAction};
use chrono::{DateTime, Utc};
use kpi_types::{
    Actor, Capability, GovernanceError, GovernanceResult, GridRow, Indicator, IndicatorEntry,
    IndicatorId, Period, Process, ProcessGrid, ProcessId, ProcessMatrix, SaveOutcome,
    SubmissionAggregate, SubmissionKey, SubmissionStatus, TenantId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Value writes retried after losing a compare-and-swap.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// One line of a bulk save
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveItem {
    pub indicator_id: IndicatorId,
    pub value: EntryValue,
}

/// Indicator governance engine
#[derive(Debug)]
pub struct GovernanceEngine {
    store: Arc<dyn GovernanceStore>,
    clock: PeriodClock,
    policy: Arc<dyn CapabilityPolicy>,
    locks: KeyedLocks<SubmissionKey>,
    audit: Mutex<AuditLog>,
}

impl GovernanceEngine {
    /// Create an engine over `store`, restoring and verifying its audit chain.
    pub async fn open(
        store: Arc<dyn GovernanceStore>,
        clock: PeriodClock,
        policy: Arc<dyn CapabilityPolicy>,
    ) -> GovernanceResult<Self> {
        let records = store.load_audit().await?;
        let audit = AuditLog::from_records(records)?;
        info!(
            audit_records = audit.len(),
            window_start = clock.window().start_day(),
            window_end = clock.window().end_day(),
            "Governance engine ready"
        );
        Ok(Self {
            store,
            clock,
            policy,
            locks: KeyedLocks::new(),
            audit: Mutex::new(audit),
        })
    }

    pub fn period_clock(&self) -> &PeriodClock {
        &self.clock
    }

    pub fn policy(&self) -> &dyn CapabilityPolicy {
        self.policy.as_ref()
    }

    // ── Tenant scoping ───────────────────────────────────────────────

    /// The process, if it exists and belongs to the caller's tenant.
    async fn scoped_process(
        &self,
        actor: &Actor,
        process_id: &ProcessId,
    ) -> GovernanceResult<Process> {
        match self.store.get_process(process_id).await? {
            Some(p) if p.tenant_id == actor.tenant_id => Ok(p),
            _ => Err(GovernanceError::NotFound(format!("process {}", process_id))),
        }
    }

    async fn scoped_processes(
        &self,
        actor: &Actor,
        process_id: Option<&ProcessId>,
    ) -> GovernanceResult<Vec<Process>> {
        match process_id {
            Some(id) => Ok(vec![self.scoped_process(actor, id).await?]),
            None => Ok(self
                .store
                .list_processes()
                .await?
                .into_iter()
                .filter(|p| p.tenant_id == actor.tenant_id)
                .collect()),
        }
    }

    async fn scoped_indicator(
        &self,
        actor: &Actor,
        indicator_id: &IndicatorId,
    ) -> GovernanceResult<Indicator> {
        let not_found = || GovernanceError::NotFound(format!("indicator {}", indicator_id));
        let indicator = self
            .store
            .get_indicator(indicator_id)
            .await?
            .ok_or_else(not_found)?;
        match self.store.get_process(&indicator.process_id).await? {
            Some(p) if p.tenant_id == actor.tenant_id => Ok(indicator),
            _ => Err(not_found()),
        }
    }

    async fn tenant_indicators(&self, tenant: &TenantId) -> GovernanceResult<Vec<Indicator>> {
        let processes: Vec<ProcessId> = self
            .store
            .list_processes()
            .await?
            .into_iter()
            .filter(|p| &p.tenant_id == tenant)
            .map(|p| p.id)
            .collect();
        Ok(self
            .store
            .list_indicators(None)
            .await?
            .into_iter()
            .filter(|i| processes.contains(&i.process_id))
            .collect())
    }

    // ── Catalog ──────────────────────────────────────────────────────

    pub async fn list_processes(&self, actor: &Actor) -> GovernanceResult<Vec<Process>> {
        self.scoped_processes(actor, None).await
    }

    pub async fn list_indicators(
        &self,
        actor: &Actor,
        process_id: Option<&ProcessId>,
    ) -> GovernanceResult<Vec<Indicator>> {
        match process_id {
            Some(id) => {
                self.scoped_process(actor, id).await?;
                Ok(self.store.list_indicators(Some(id)).await?)
            }
            None => self.tenant_indicators(&actor.tenant_id).await,
        }
    }

    pub async fn register_process(
        &self,
        actor: &Actor,
        request: NewProcess,
    ) -> GovernanceResult<Process> {
        self.policy.require(actor, Capability::ManageCatalog)?;
        let process = Process::new(actor.tenant_id.clone(), request.code.trim(), request.label);
        self.insert_process(process).await
    }

    async fn insert_process(&self, process: Process) -> GovernanceResult<Process> {
        if process.code.is_empty() {
            return Err(GovernanceError::InvalidCatalog(
                "process code must not be empty".into(),
            ));
        }
        // Code uniqueness is enforced by the store under its write lock.
        self.store.insert_process(process.clone()).await?;
        info!(process_id = %process.id, code = %process.code, "Process registered");
        Ok(process)
    }

    pub async fn register_indicator(
        &self,
        actor: &Actor,
        request: NewIndicator,
    ) -> GovernanceResult<Indicator> {
        self.policy.require(actor, Capability::ManageCatalog)?;
        self.scoped_process(actor, &request.process_id)
            .await
            .map_err(|_| {
                GovernanceError::InvalidCatalog(format!(
                    "owning process {} does not exist",
                    request.process_id
                ))
            })?;
        self.insert_indicator(request.into_indicator()).await
    }

    async fn insert_indicator(&self, indicator: Indicator) -> GovernanceResult<Indicator> {
        indicator.validate()?;
        self.store.insert_indicator(indicator.clone()).await?;
        info!(
            indicator_id = %indicator.id,
            code = %indicator.code,
            frequency = %indicator.frequency,
            "Indicator registered"
        );
        Ok(indicator)
    }

    pub async fn update_indicator(
        &self,
        actor: &Actor,
        indicator_id: &IndicatorId,
        update: IndicatorUpdate,
    ) -> GovernanceResult<Indicator> {
        self.policy.require(actor, Capability::ManageCatalog)?;
        let current = self.scoped_indicator(actor, indicator_id).await?;
        let next = update.apply_to(&current);
        next.validate()?;
        self.store.update_indicator(next.clone()).await?;
        info!(indicator_id = %next.id, code = %next.code, "Indicator updated");
        Ok(next)
    }

    /// Soft-deactivate an indicator. Its history stays readable.
    pub async fn deactivate_indicator(
        &self,
        actor: &Actor,
        indicator_id: &IndicatorId,
        now: DateTime<Utc>,
    ) -> GovernanceResult<Indicator> {
        self.policy.require(actor, Capability::ManageCatalog)?;
        let mut indicator = self.scoped_indicator(actor, indicator_id).await?;
        if !indicator.active {
            return Ok(indicator);
        }
        indicator.deactivate(now);
        self.store.update_indicator(indicator.clone()).await?;
        info!(indicator_id = %indicator.id, code = %indicator.code, "Indicator deactivated");
        Ok(indicator)
    }

    /// Load a seed into `tenant`'s catalog.
    ///
    /// Every line is checked before anything is written. Codes that already
    /// exist are skipped, so a seed can be applied on every start.
    pub async fn seed_catalog(
        &self,
        tenant: &TenantId,
        seed: CatalogSeed,
    ) -> GovernanceResult<SeedSummary> {
        let mut summary = SeedSummary::default();
        let mut by_code: HashMap<String, ProcessId> = self
            .store
            .list_processes()
            .await?
            .into_iter()
            .filter(|p| &p.tenant_id == tenant)
            .map(|p| (p.code, p.id))
            .collect();

        let mut new_processes = Vec::new();
        for line in seed.processes {
            let code = line.code.trim().to_string();
            if by_code.contains_key(&code) {
                summary.skipped += 1;
                continue;
            }
            let process = Process::new(tenant.clone(), code.clone(), line.label);
            by_code.insert(code, process.id.clone());
            new_processes.push(process);
        }

        let mut indicator_codes: HashSet<String> = self
            .tenant_indicators(tenant)
            .await?
            .into_iter()
            .map(|i| i.code)
            .collect();

        let mut new_indicators = Vec::new();
        for line in seed.indicators {
            let frequency = line.frequency.parse()?;
            let code = line.code.trim().to_string();
            if !indicator_codes.insert(code.clone()) {
                summary.skipped += 1;
                continue;
            }
            let process_id = by_code.get(line.process_code.trim()).cloned().ok_or_else(|| {
                GovernanceError::InvalidCatalog(format!(
                    "indicator {} references unknown process {}",
                    line.code, line.process_code
                ))
            })?;
            let indicator = Indicator::new(
                code,
                line.label,
                process_id,
                frequency,
                line.target,
            )
            .with_unit(line.unit)
            .with_direction(line.direction)
            .with_calculation_mode(line.calculation_mode);
            indicator.validate()?;
            new_indicators.push(indicator);
        }

        for process in new_processes {
            self.insert_process(process).await?;
            summary.processes_added += 1;
        }
        for indicator in new_indicators {
            self.insert_indicator(indicator).await?;
            summary.indicators_added += 1;
        }
        info!(
            tenant = %tenant,
            processes = summary.processes_added,
            indicators = summary.indicators_added,
            skipped = summary.skipped,
            "Catalog seeded"
        );
        Ok(summary)
    }

    // ── Submissions ──────────────────────────────────────────────────

    async fn load_or_new(
        &self,
        key: &SubmissionKey,
        now: DateTime<Utc>,
    ) -> GovernanceResult<SubmissionAggregate> {
        Ok(self
            .store
            .get_submission(key)
            .await?
            .unwrap_or_else(|| SubmissionAggregate::new(key.clone(), now)))
    }

    /// Persist a record in the chain after its change has been saved.
    ///
    /// A failure to persist the record is logged, not surfaced: the change
    /// it describes is already durable.
    async fn record_audit(
        &self,
        key: SubmissionKey,
        event: AuditEvent,
        actor: &Actor,
        now: DateTime<Utc>,
    ) {
        let mut log = self.audit.lock().await;
        let record = log.build(key, event, &actor.id, now);
        if let Err(e) = self.store.append_audit(record.clone()).await {
            error!(error = %e, index = record.index, "Failed to persist audit record");
            return;
        }
        if let Err(e) = log.commit(record) {
            error!(error = %e, "Audit chain rejected a record");
        }
    }

    /// Fetch a submission of a tenant-visible process, if it was created.
    pub async fn submission(
        &self,
        actor: &Actor,
        key: &SubmissionKey,
    ) -> GovernanceResult<Option<SubmissionAggregate>> {
        self.scoped_process(actor, &key.process_id).await?;
        Ok(self.store.get_submission(key).await?)
    }

    /// Write one value into the submission of the indicator's process for
    /// `period`, creating the submission as a draft if needed.
    pub async fn record_value(
        &self,
        actor: &Actor,
        indicator_id: &IndicatorId,
        period: Period,
        value: &EntryValue,
        now: DateTime<Utc>,
    ) -> GovernanceResult<IndicatorEntry> {
        let indicator = self.scoped_indicator(actor, indicator_id).await?;
        let key = SubmissionKey::new(indicator.process_id.clone(), period);
        let _guard = self.locks.lock(&key).await;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.load_or_new(&key, now).await?;
            let written = entry::record_value(
                &current,
                &indicator,
                value,
                actor,
                now,
                &self.clock,
                self.policy.as_ref(),
            )
            .inspect_err(|e| {
                warn!(
                    submission = %key,
                    indicator = %indicator.code,
                    actor = %actor.id,
                    code = e.code(),
                    "Value write refused: {}", e
                );
            })?;

            match self.store.save_submission(written.aggregate).await {
                Ok(saved) => {
                    info!(
                        submission = %key,
                        indicator = %indicator.code,
                        actor = %actor.id,
                        value = written.value,
                        admin_override = written.authority.is_override(),
                        "Value recorded"
                    );
                    self.record_audit(
                        key.clone(),
                        AuditEvent::ValueRecorded {
                            indicator_id: indicator.id.clone(),
                            value: written.value,
                            admin_override: written.authority.is_override(),
                        },
                        actor,
                        now,
                    )
                    .await;
                    return saved.entry(&indicator.id).cloned().ok_or_else(|| {
                        GovernanceError::Storage(format!("entry missing after save on {}", key))
                    });
                }
                Err(StorageError::VersionConflict { .. }) => {
                    debug!(submission = %key, attempt, "Version conflict on value write, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(GovernanceError::Storage(format!(
            "gave up writing {} after {} conflicting attempts",
            key, MAX_WRITE_ATTEMPTS
        )))
    }

    /// Apply each item independently and report per-item results.
    pub async fn bulk_save(
        &self,
        actor: &Actor,
        period: Period,
        items: Vec<SaveItem>,
        now: DateTime<Utc>,
    ) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let outcome = match self
                .record_value(actor, &item.indicator_id, period, &item.value, now)
                .await
            {
                Ok(entry) => SaveOutcome::saved(item.indicator_id, entry.value.unwrap_or_default()),
                Err(e) => SaveOutcome::failed(item.indicator_id, &e),
            };
            outcomes.push(outcome);
        }
        let saved = outcomes.iter().filter(|o| o.saved).count();
        debug!(
            actor = %actor.id,
            period = %period,
            saved,
            failed = outcomes.len() - saved,
            "Bulk save finished"
        );
        outcomes
    }

    /// Run a workflow step on a submission.
    ///
    /// Losing a race against a concurrent transition is reported as
    /// `InvalidTransition` from the status that won.
    pub async fn transition(
        &self,
        action: WorkflowAction,
        actor: &Actor,
        key: &SubmissionKey,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> GovernanceResult<SubmissionAggregate> {
        self.scoped_process(actor, &key.process_id).await?;
        let _guard = self.locks.lock(key).await;

        let current = self.load_or_new(key, now).await?;
        let ctx = TransitionContext {
            actor,
            now,
            clock: &self.clock,
            policy: self.policy.as_ref(),
        };
        let next = workflow::apply(action, &current, &ctx, note).inspect_err(|e| {
            warn!(
                submission = %key,
                action = action.name(),
                actor = %actor.id,
                code = e.code(),
                "Transition refused: {}", e
            );
        })?;
        let note = next.last_status_change.as_ref().and_then(|c| c.note.clone());

        let saved = match self.store.save_submission(next).await {
            Ok(saved) => saved,
            Err(StorageError::VersionConflict { .. }) => {
                let latest = self.load_or_new(key, now).await?;
                warn!(submission = %key, action = action.name(), "Transition lost a race");
                return Err(GovernanceError::invalid_transition(
                    latest.surfaced_status(),
                    action.name(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            submission = %key,
            action = action.name(),
            actor = %actor.id,
            from = %current.surfaced_status(),
            to = %saved.surfaced_status(),
            "Submission transitioned"
        );
        self.record_audit(
            key.clone(),
            AuditEvent::StatusChanged {
                from: current.surfaced_status(),
                to: saved.surfaced_status(),
                action: action.name().to_string(),
                note,
            },
            actor,
            now,
        )
        .await;
        Ok(saved)
    }

    pub async fn submit(
        &self,
        actor: &Actor,
        key: &SubmissionKey,
        now: DateTime<Utc>,
    ) -> GovernanceResult<SubmissionAggregate> {
        self.transition(WorkflowAction::Submit, actor, key, None, now)
            .await
    }

    pub async fn validate(
        &self,
        actor: &Actor,
        key: &SubmissionKey,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> GovernanceResult<SubmissionAggregate> {
        self.transition(WorkflowAction::Validate, actor, key, note, now)
            .await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        key: &SubmissionKey,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> GovernanceResult<SubmissionAggregate> {
        self.transition(WorkflowAction::Reject, actor, key, note, now)
            .await
    }

    // ── Read models ──────────────────────────────────────────────────

    /// Monthly entry grid for one process, or for every process of the
    /// caller's tenant. Never creates a submission.
    pub async fn monthly_grid(
        &self,
        actor: &Actor,
        process_id: Option<&ProcessId>,
        period: Period,
        now: DateTime<Utc>,
    ) -> GovernanceResult<Vec<ProcessGrid>> {
        let processes = self.scoped_processes(actor, process_id).await?;
        let mut grids = Vec::with_capacity(processes.len());
        for process in processes {
            grids.push(self.process_grid(actor, process, period, now).await?);
        }
        Ok(grids)
    }

    async fn process_grid(
        &self,
        actor: &Actor,
        process: Process,
        period: Period,
        now: DateTime<Utc>,
    ) -> GovernanceResult<ProcessGrid> {
        let indicators: Vec<Indicator> = self
            .store
            .list_indicators(Some(&process.id))
            .await?
            .into_iter()
            .filter(|i| i.active)
            .collect();
        let key = SubmissionKey::new(process.id.clone(), period);
        let aggregate = self.store.get_submission(&key).await?;

        let target = EditTarget {
            period,
            status: aggregate
                .as_ref()
                .map(|a| a.status)
                .unwrap_or(SubmissionStatus::Draft),
        };
        let rows = indicators
            .iter()
            .map(|ind| {
                let entry = aggregate.as_ref().and_then(|a| a.entry(&ind.id));
                GridRow {
                    indicator_id: ind.id.clone(),
                    code: ind.code.clone(),
                    label: ind.label.clone(),
                    unit: ind.unit.clone(),
                    target: ind.target,
                    frequency: ind.frequency,
                    value: entry.and_then(|e| e.value),
                    updated_by: entry.map(|e| e.updated_by.clone()),
                    updated_at: entry.map(|e| e.updated_at),
                    due: is_due(ind, period),
                    editable: can_edit(ind, target, actor, now, &self.clock, self.policy.as_ref()),
                }
            })
            .collect();

        Ok(ProcessGrid {
            process_id: process.id,
            process_code: process.code,
            process_label: process.label,
            period,
            submission_id: aggregate.as_ref().map(|a| a.id.clone()),
            status: aggregate
                .as_ref()
                .map(|a| a.surfaced_status())
                .unwrap_or(SubmissionStatus::Draft),
            rejection_note: aggregate
                .as_ref()
                .filter(|a| a.surfaced_status() == SubmissionStatus::Rejected)
                .and_then(|a| a.last_rejection.as_ref())
                .and_then(|r| r.note.clone()),
            window_open: self.clock.is_within_entry_window(now),
            completion: entry::completion(aggregate.as_ref(), period, &indicators),
            rows,
        })
    }

    /// Annual matrix for one process, or for every process of the caller's
    /// tenant.
    pub async fn annual_matrix(
        &self,
        actor: &Actor,
        process_id: Option<&ProcessId>,
        year: i32,
    ) -> GovernanceResult<Vec<ProcessMatrix>> {
        let processes = self.scoped_processes(actor, process_id).await?;
        let mut matrices = Vec::with_capacity(processes.len());
        for process in processes {
            let indicators = self.store.list_indicators(Some(&process.id)).await?;
            let aggregates = self.store.list_submissions(&process.id, year).await?;
            matrices.push(build_matrix(&process, year, &indicators, &aggregates));
        }
        Ok(matrices)
    }

    /// Audit records of one submission, oldest first.
    pub async fn audit_trail(
        &self,
        actor: &Actor,
        key: &SubmissionKey,
    ) -> GovernanceResult<Vec<AuditRecord>> {
        self.scoped_process(actor, &key.process_id).await?;
        let log = self.audit.lock().await;
        Ok(log.for_key(key).cloned().collect())
    }

    /// Whether the in-memory audit chain is intact.
    pub async fn verify_audit_chain(&self) -> bool {
        self.audit.lock().await.verify_chain()
    }
}
