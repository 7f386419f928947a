//! Read models: the monthly entry grid and the annual matrix

use crate::{
    ComparisonDirection, Frequency, GovernanceError, IndicatorId, Period, ProcessId,
    SubmissionId, SubmissionStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Monthly grid ─────────────────────────────────────────────────────

/// Completion of a submission, counting due indicators only
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub due: usize,
    pub filled: usize,
}

impl Completion {
    /// Fraction of due indicators that hold a value; `None` when nothing is due.
    pub fn ratio(&self) -> Option<f64> {
        if self.due == 0 {
            None
        } else {
            Some(self.filled as f64 / self.due as f64)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.filled >= self.due
    }
}

/// One indicator line of the monthly entry form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub indicator_id: IndicatorId,
    pub code: String,
    pub label: String,
    pub unit: String,
    pub target: f64,
    pub frequency: Frequency,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Whether the indicator expects a value this period
    pub due: bool,
    /// Whether the requesting actor may write this cell right now
    pub editable: bool,
}

/// The monthly entry form for one process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessGrid {
    pub process_id: ProcessId,
    pub process_code: String,
    pub process_label: String,
    pub period: Period,
    /// `None` until the submission has been written to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub submission_id: Option<SubmissionId>,
    /// Surfaced status (`REJECTED` after a rejection until resubmitted)
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rejection_note: Option<String>,
    pub window_open: bool,
    pub completion: Completion,
    pub rows: Vec<GridRow>,
}

// ── Bulk save ────────────────────────────────────────────────────────

/// Per-item result of a bulk save
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub indicator_id: IndicatorId,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn saved(indicator_id: IndicatorId, value: f64) -> Self {
        Self {
            indicator_id,
            saved: true,
            value: Some(value),
            error_code: None,
            error: None,
        }
    }

    pub fn failed(indicator_id: IndicatorId, error: &GovernanceError) -> Self {
        Self {
            indicator_id,
            saved: false,
            value: None,
            error_code: Some(error.code().to_string()),
            error: Some(error.to_string()),
        }
    }
}

// ── Annual matrix ────────────────────────────────────────────────────

/// One month of an annual matrix row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub month: u32,
    pub actual: Option<f64>,
    pub due: bool,
    /// `None` when the cell is empty
    pub conforms: Option<bool>,
    /// Surfaced status of that month's submission, if it exists
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<SubmissionStatus>,
}

/// Aggregates over the due months of a row
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSummary {
    pub due_months: usize,
    pub filled: usize,
    pub conforming: usize,
    pub conformity_rate: Option<f64>,
    pub mean_actual: Option<f64>,
}

/// Twelve months of one indicator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnualMatrixRow {
    pub indicator_id: IndicatorId,
    pub code: String,
    pub label: String,
    pub unit: String,
    pub target: f64,
    pub direction: ComparisonDirection,
    pub frequency: Frequency,
    pub active: bool,
    /// Always twelve cells, January first
    pub cells: Vec<MatrixCell>,
    pub summary: RowSummary,
}

/// Annual matrix of one process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessMatrix {
    pub process_id: ProcessId,
    pub process_code: String,
    pub process_label: String,
    pub year: i32,
    pub rows: Vec<AnnualMatrixRow>,
}
