//! Submission aggregates: one workflow unit per (process, period)
//!
//! A submission holds every indicator entry recorded for a process in a
//! month, plus the single status shared by all of them. Status lives on the
//! aggregate itself so an empty submission still has one.

use crate::{IndicatorId, Period, ProcessId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Status ───────────────────────────────────────────────────────────

/// Workflow status of a submission.
///
/// `Rejected` is never stored: a rejection reopens the submission as
/// `Draft` and leaves a [`RejectionNote`], which [`SubmissionAggregate::surfaced_status`]
/// reports as `Rejected` until the next submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Validated,
    Rejected,
}

impl SubmissionStatus {
    pub fn name(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Validated => "VALIDATED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Validated)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Key ──────────────────────────────────────────────────────────────

/// Natural key of a submission: at most one aggregate exists per key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub process_id: ProcessId,
    pub period: Period,
}

impl SubmissionKey {
    pub fn new(process_id: ProcessId, period: Period) -> Self {
        Self { process_id, period }
    }
}

impl std::fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.process_id, self.period)
    }
}

// ── Entries ──────────────────────────────────────────────────────────

/// One indicator value inside a submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEntry {
    pub indicator_id: IndicatorId,
    /// `None` until a value has been entered
    pub value: Option<f64>,
    pub updated_at: DateTime<Utc>,
    /// Identity of the last writer
    pub updated_by: String,
    /// Set when the last write used administrator authority outside the
    /// normal window/status/due-ness rules
    #[serde(default)]
    pub admin_override: bool,
}

/// Reviewer feedback left by a rejection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RejectionNote {
    pub rejected_by: String,
    pub rejected_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

/// Record of the latest status change
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: SubmissionStatus,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

// ── Aggregate ────────────────────────────────────────────────────────

/// The per-process, per-period submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAggregate {
    pub id: SubmissionId,
    pub key: SubmissionKey,
    pub status: SubmissionStatus,
    /// Entries in insertion order
    pub entries: Vec<IndicatorEntry>,
    /// Incremented on every persisted mutation; used for compare-and-swap
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_rejection: Option<RejectionNote>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_status_change: Option<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionAggregate {
    /// A fresh draft submission.
    pub fn new(key: SubmissionKey, now: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::generate(),
            key,
            status: SubmissionStatus::Draft,
            entries: Vec::new(),
            version: 0,
            last_rejection: None,
            last_status_change: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn process_id(&self) -> &ProcessId {
        &self.key.process_id
    }

    pub fn period(&self) -> Period {
        self.key.period
    }

    /// Status as shown to the submitter.
    pub fn surfaced_status(&self) -> SubmissionStatus {
        if self.status == SubmissionStatus::Draft && self.last_rejection.is_some() {
            SubmissionStatus::Rejected
        } else {
            self.status
        }
    }

    pub fn entry(&self, indicator_id: &IndicatorId) -> Option<&IndicatorEntry> {
        self.entries.iter().find(|e| &e.indicator_id == indicator_id)
    }

    pub fn value_of(&self, indicator_id: &IndicatorId) -> Option<f64> {
        self.entry(indicator_id).and_then(|e| e.value)
    }

    /// Insert or replace the entry for `entry.indicator_id`, keeping the
    /// original insertion position on replace.
    pub fn upsert_entry(&mut self, entry: IndicatorEntry) {
        self.updated_at = entry.updated_at;
        match self
            .entries
            .iter_mut()
            .find(|e| e.indicator_id == entry.indicator_id)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Apply a status change. Callers are responsible for checking that the
    /// transition is legal.
    pub fn set_status(
        &mut self,
        status: SubmissionStatus,
        actor: &str,
        at: DateTime<Utc>,
        note: Option<String>,
    ) {
        self.status = status;
        self.updated_at = at;
        self.last_status_change = Some(StatusChange {
            status,
            changed_by: actor.to_string(),
            changed_at: at,
            note,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_aggregate() -> SubmissionAggregate {
        SubmissionAggregate::new(
            SubmissionKey::new(ProcessId::new("proc-a"), Period::new(3, 2026).unwrap()),
            Utc::now(),
        )
    }

    fn entry(id: &str, value: f64) -> IndicatorEntry {
        IndicatorEntry {
            indicator_id: IndicatorId::new(id),
            value: Some(value),
            updated_at: Utc::now(),
            updated_by: "alice".into(),
            admin_override: false,
        }
    }

    #[test]
    fn test_new_aggregate_is_draft() {
        let agg = make_aggregate();
        assert_eq!(agg.status, SubmissionStatus::Draft);
        assert_eq!(agg.surfaced_status(), SubmissionStatus::Draft);
        assert_eq!(agg.version, 0);
        assert!(agg.entries.is_empty());
    }

    #[test]
    fn test_upsert_keeps_insertion_order() {
        let mut agg = make_aggregate();
        agg.upsert_entry(entry("a", 1.0));
        agg.upsert_entry(entry("b", 2.0));
        agg.upsert_entry(entry("a", 3.0));

        let ids: Vec<&str> = agg.entries.iter().map(|e| e.indicator_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(agg.value_of(&IndicatorId::new("a")), Some(3.0));
    }

    #[test]
    fn test_rejection_is_surfaced_on_draft() {
        let mut agg = make_aggregate();
        agg.last_rejection = Some(RejectionNote {
            rejected_by: "qm".into(),
            rejected_at: Utc::now(),
            note: Some("check IND-03".into()),
        });
        assert_eq!(agg.status, SubmissionStatus::Draft);
        assert_eq!(agg.surfaced_status(), SubmissionStatus::Rejected);
    }
}
