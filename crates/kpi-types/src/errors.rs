//! Error types for indicator governance

use crate::{IndicatorId, SubmissionStatus};

/// Errors returned by governance operations.
///
/// Every variant is recoverable by the caller. A failed operation never
/// leaves a submission partially modified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GovernanceError {
    #[error("Invalid transition: cannot {action} a submission in status {from}")]
    InvalidTransition {
        from: SubmissionStatus,
        action: String,
    },

    #[error("Entry window closed: day {day} is outside days {start_day}..={end_day}")]
    WindowClosed { day: u32, start_day: u32, end_day: u32 },

    #[error("Edit not permitted on indicator {indicator}: {reason}")]
    EditNotPermitted {
        indicator: IndicatorId,
        reason: String,
    },

    #[error("Actor {actor} is not authorized to {action}")]
    NotAuthorized { actor: String, action: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidCatalog(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl GovernanceError {
    pub fn invalid_transition(from: SubmissionStatus, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from,
            action: action.into(),
        }
    }

    pub fn edit_not_permitted(indicator: &IndicatorId, reason: impl Into<String>) -> Self {
        Self::EditNotPermitted {
            indicator: indicator.clone(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used by the REST layer and in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::WindowClosed { .. } => "WINDOW_CLOSED",
            Self::EditNotPermitted { .. } => "EDIT_NOT_PERMITTED",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::InvalidValue(_) => "INVALID_VALUE",
            Self::UnknownFrequency(_) => "UNKNOWN_FREQUENCY",
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::InvalidCatalog(_) => "INVALID_CATALOG",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Result type alias for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
