//! Submission handlers: workflow transitions, read-out and audit trail

use crate::api::rest::caller::Caller;
use crate::api::rest::extract::{ApiJson, ApiPath};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use kpi_engine::{AuditRecord, WorkflowAction};
use kpi_types::{
    Actor, GovernanceError, Period, ProcessId, SubmissionAggregate, SubmissionKey,
    SubmissionStatus,
};
use serde::{Deserialize, Serialize};

/// Optional reviewer note for a transition
#[derive(Debug, Default, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Submission with the status clients should display
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub submission: SubmissionAggregate,
    /// `REJECTED` while a rejection note is pending
    pub surfaced_status: SubmissionStatus,
}

impl From<SubmissionAggregate> for SubmissionResponse {
    fn from(submission: SubmissionAggregate) -> Self {
        Self {
            surfaced_status: submission.surfaced_status(),
            submission,
        }
    }
}

fn submission_key((process_id, year, month): (String, i32, u32)) -> ApiResult<SubmissionKey> {
    let period = Period::new(month, year)?;
    Ok(SubmissionKey::new(ProcessId::new(process_id), period))
}

async fn transition(
    state: AppState,
    actor: Actor,
    action: WorkflowAction,
    path: (String, i32, u32),
    body: Option<ApiJson<TransitionRequest>>,
) -> ApiResult<Json<SubmissionResponse>> {
    let key = submission_key(path)?;
    let note = body.and_then(|ApiJson(request)| request.note);

    let aggregate = state
        .engine
        .transition(action, &actor, &key, note, state.now())
        .await?;

    Ok(Json(aggregate.into()))
}

/// Get a submission
pub async fn get_submission(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(path): ApiPath<(String, i32, u32)>,
) -> ApiResult<Json<SubmissionResponse>> {
    let key = submission_key(path)?;
    let aggregate = state
        .engine
        .submission(&actor, &key)
        .await?
        .ok_or_else(|| GovernanceError::NotFound(format!("submission {}", key)))?;

    Ok(Json(aggregate.into()))
}

/// DRAFT → SUBMITTED
pub async fn submit_submission(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(path): ApiPath<(String, i32, u32)>,
    body: Option<ApiJson<TransitionRequest>>,
) -> ApiResult<Json<SubmissionResponse>> {
    transition(state, actor, WorkflowAction::Submit, path, body).await
}

/// SUBMITTED → VALIDATED
pub async fn validate_submission(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(path): ApiPath<(String, i32, u32)>,
    body: Option<ApiJson<TransitionRequest>>,
) -> ApiResult<Json<SubmissionResponse>> {
    transition(state, actor, WorkflowAction::Validate, path, body).await
}

/// SUBMITTED → DRAFT, surfaced as REJECTED until resubmitted
pub async fn reject_submission(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(path): ApiPath<(String, i32, u32)>,
    body: Option<ApiJson<TransitionRequest>>,
) -> ApiResult<Json<SubmissionResponse>> {
    transition(state, actor, WorkflowAction::Reject, path, body).await
}

/// Audit trail of a submission, oldest first
pub async fn get_audit_trail(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(path): ApiPath<(String, i32, u32)>,
) -> ApiResult<Json<Vec<AuditRecord>>> {
    let key = submission_key(path)?;
    Ok(Json(state.engine.audit_trail(&actor, &key).await?))
}
