//! Error types for kpid

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kpi_engine::StorageError;
use kpi_types::GovernanceError;
use serde::Serialize;
use thiserror::Error;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage backend could not be opened
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Engine bootstrap or catalog seeding failed
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed caller context, body, query or path
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Governance(#[from] GovernanceError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Governance(err) => match err {
                GovernanceError::InvalidTransition { .. } => StatusCode::CONFLICT,
                GovernanceError::WindowClosed { .. } => StatusCode::LOCKED,
                GovernanceError::EditNotPermitted { .. } | GovernanceError::NotAuthorized { .. } => {
                    StatusCode::FORBIDDEN
                }
                GovernanceError::InvalidValue(_)
                | GovernanceError::InvalidPeriod(_)
                | GovernanceError::InvalidCatalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
                GovernanceError::NotFound(_) => StatusCode::NOT_FOUND,
                GovernanceError::UnknownFrequency(_) | GovernanceError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Governance(err) => err.code(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Governance(GovernanceError::InvalidTransition { from, action }) => {
                Some(serde_json::json!({ "from": from, "action": action }))
            }
            ApiError::Governance(GovernanceError::WindowClosed {
                day,
                start_day,
                end_day,
            }) => Some(serde_json::json!({
                "day": day,
                "start_day": start_day,
                "end_day": end_day,
            })),
            ApiError::Governance(GovernanceError::EditNotPermitted { indicator, reason }) => {
                Some(serde_json::json!({ "indicator_id": indicator, "reason": reason }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_types::{IndicatorId, SubmissionStatus};

    fn status_of(err: GovernanceError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_governance_error_status_codes() {
        assert_eq!(
            status_of(GovernanceError::invalid_transition(
                SubmissionStatus::Submitted,
                "submit"
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(GovernanceError::WindowClosed {
                day: 15,
                start_day: 1,
                end_day: 10
            }),
            StatusCode::LOCKED
        );
        assert_eq!(
            status_of(GovernanceError::edit_not_permitted(
                &IndicatorId::new("i"),
                "not due"
            )),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(GovernanceError::InvalidValue("abc".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(GovernanceError::UnknownFrequency("WEEKLY".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(GovernanceError::NotFound("process".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_bad_request_status_code() {
        assert_eq!(
            ApiError::BadRequest("missing x-actor-id".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
