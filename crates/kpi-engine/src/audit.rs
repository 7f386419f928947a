//! Append-only, hash-chained audit trail of submission changes
//!
//! Every value write and every status change is recorded after it has been
//! persisted. Records are chained with blake3 so tampering with an earlier
//! record invalidates every later hash.

use chrono::{DateTime, Utc};
use kpi_types::{GovernanceError, GovernanceResult, IndicatorId, SubmissionKey, SubmissionStatus};
use serde::{Deserialize, Serialize};

/// What happened to a submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    ValueRecorded {
        indicator_id: IndicatorId,
        value: f64,
        admin_override: bool,
    },
    StatusChanged {
        from: SubmissionStatus,
        to: SubmissionStatus,
        action: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        note: Option<String>,
    },
}

/// One link of the chain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub index: u64,
    pub key: SubmissionKey,
    pub event: AuditEvent,
    pub actor: String,
    pub at: DateTime<Utc>,
    pub previous_hash: Option<String>,
    pub hash: String,
}

/// The audit chain for all submissions
#[derive(Clone, Debug, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records, refusing a broken chain.
    pub fn from_records(records: Vec<AuditRecord>) -> GovernanceResult<Self> {
        for (position, record) in records.iter().enumerate() {
            if record.index != position as u64 {
                return Err(GovernanceError::Storage(format!(
                    "audit index gap at position {} (found {})",
                    position, record.index
                )));
            }
        }
        let log = Self { records };
        if !log.verify_chain() {
            return Err(GovernanceError::Storage(
                "audit hash chain verification failed".into(),
            ));
        }
        Ok(log)
    }

    /// Append a record and return it.
    pub fn append(
        &mut self,
        key: SubmissionKey,
        event: AuditEvent,
        actor: &str,
        at: DateTime<Utc>,
    ) -> &AuditRecord {
        let record = self.build(key, event, actor, at);
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Build the next record without extending the chain, so it can be
    /// persisted before [`AuditLog::commit`].
    pub fn build(
        &self,
        key: SubmissionKey,
        event: AuditEvent,
        actor: &str,
        at: DateTime<Utc>,
    ) -> AuditRecord {
        let index = self.records.len() as u64;
        let previous_hash = self.records.last().map(|r| r.hash.clone());
        let hash = compute_hash(index, &key, &event, actor, at, previous_hash.as_deref());
        AuditRecord {
            index,
            key,
            event,
            actor: actor.to_string(),
            at,
            previous_hash,
            hash,
        }
    }

    /// Extend the chain with a record produced by [`AuditLog::build`].
    pub fn commit(&mut self, record: AuditRecord) -> GovernanceResult<()> {
        let expected_index = self.records.len() as u64;
        if record.index != expected_index {
            return Err(GovernanceError::Storage(format!(
                "audit commit index mismatch: expected {}, got {}",
                expected_index, record.index
            )));
        }
        let expected_previous = self.records.last().map(|r| r.hash.as_str());
        let expected_hash = compute_hash(
            record.index,
            &record.key,
            &record.event,
            &record.actor,
            record.at,
            expected_previous,
        );
        if record.previous_hash.as_deref() != expected_previous || record.hash != expected_hash {
            return Err(GovernanceError::Storage(
                "audit commit hash mismatch".into(),
            ));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one submission, oldest first.
    pub fn for_key<'a>(
        &'a self,
        key: &'a SubmissionKey,
    ) -> impl Iterator<Item = &'a AuditRecord> {
        self.records.iter().filter(move |r| &r.key == key)
    }

    pub fn verify_chain(&self) -> bool {
        let mut previous: Option<&str> = None;
        for record in &self.records {
            if record.previous_hash.as_deref() != previous {
                return false;
            }
            let expected = compute_hash(
                record.index,
                &record.key,
                &record.event,
                &record.actor,
                record.at,
                previous,
            );
            if record.hash != expected {
                return false;
            }
            previous = Some(&record.hash);
        }
        true
    }
}

fn compute_hash(
    index: u64,
    key: &SubmissionKey,
    event: &AuditEvent,
    actor: &str,
    at: DateTime<Utc>,
    previous_hash: Option<&str>,
) -> String {
    let material = serde_json::json!({
        "index": index,
        "key": key,
        "event": event,
        "actor": actor,
        "at": at,
        "previous_hash": previous_hash,
    });
    let bytes = serde_json::to_vec(&material).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}
