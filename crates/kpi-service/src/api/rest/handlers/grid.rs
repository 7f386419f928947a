//! Monthly grid handlers: read the entry form and bulk-save values

use crate::api::rest::caller::Caller;
use crate::api::rest::extract::{ApiJson, ApiQuery};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use kpi_engine::SaveItem;
use kpi_types::{Period, ProcessGrid, ProcessId, SaveOutcome};
use serde::{Deserialize, Serialize};

/// Grid query; the period defaults to the current one
#[derive(Debug, Deserialize)]
pub struct GridQuery {
    pub process_id: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Grid response
#[derive(Debug, Serialize)]
pub struct GridResponse {
    pub period: Period,
    pub processes: Vec<ProcessGrid>,
}

/// Bulk save request
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub month: u32,
    pub year: i32,
    pub values: Vec<SaveItem>,
}

/// Bulk save response; one result per submitted value
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub period: Period,
    pub saved: usize,
    pub failed: usize,
    pub results: Vec<SaveOutcome>,
}

fn resolve_period(
    state: &AppState,
    month: Option<u32>,
    year: Option<i32>,
    now: DateTime<Utc>,
) -> ApiResult<Period> {
    match (month, year) {
        (Some(month), Some(year)) => Ok(Period::new(month, year)?),
        (None, None) => Ok(state.engine.period_clock().current_period(now)),
        _ => Err(ApiError::BadRequest(
            "month and year must be given together".to_string(),
        )),
    }
}

/// Monthly grid of one process, or of every process of the caller's tenant
pub async fn get_grid(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiQuery(query): ApiQuery<GridQuery>,
) -> ApiResult<Json<GridResponse>> {
    let now = state.now();
    let period = resolve_period(&state, query.month, query.year, now)?;
    let process_id = query.process_id.map(ProcessId::new);

    let processes = state
        .engine
        .monthly_grid(&actor, process_id.as_ref(), period, now)
        .await?;

    Ok(Json(GridResponse { period, processes }))
}

/// Save several values at once; each value succeeds or fails on its own
pub async fn save_grid(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(request): ApiJson<SaveRequest>,
) -> ApiResult<Json<SaveResponse>> {
    let now = state.now();
    let period = Period::new(request.month, request.year)?;

    let results = state
        .engine
        .bulk_save(&actor, period, request.values, now)
        .await;
    let saved = results.iter().filter(|r| r.saved).count();

    Ok(Json(SaveResponse {
        period,
        saved,
        failed: results.len() - saved,
        results,
    }))
}
