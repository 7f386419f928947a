//! Catalog administration handlers

use crate::api::rest::caller::Caller;
use crate::api::rest::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, http::StatusCode, Json};
use kpi_engine::{IndicatorUpdate, NewIndicator, NewProcess};
use kpi_types::{Indicator, IndicatorId, Process, ProcessId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IndicatorQuery {
    pub process_id: Option<String>,
}

/// List the caller's processes
pub async fn list_processes(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> ApiResult<Json<Vec<Process>>> {
    Ok(Json(state.engine.list_processes(&actor).await?))
}

/// Register a process
pub async fn create_process(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(request): ApiJson<NewProcess>,
) -> ApiResult<(StatusCode, Json<Process>)> {
    let process = state.engine.register_process(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(process)))
}

/// List indicators, optionally of one process
pub async fn list_indicators(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiQuery(query): ApiQuery<IndicatorQuery>,
) -> ApiResult<Json<Vec<Indicator>>> {
    let process_id = query.process_id.map(ProcessId::new);
    Ok(Json(
        state
            .engine
            .list_indicators(&actor, process_id.as_ref())
            .await?,
    ))
}

/// Register an indicator
pub async fn create_indicator(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(request): ApiJson<NewIndicator>,
) -> ApiResult<(StatusCode, Json<Indicator>)> {
    let indicator = state.engine.register_indicator(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(indicator)))
}

/// Update an indicator's label, unit, target, cadence or direction
pub async fn update_indicator(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(update): ApiJson<IndicatorUpdate>,
) -> ApiResult<Json<Indicator>> {
    let indicator = state
        .engine
        .update_indicator(&actor, &IndicatorId::new(id), update)
        .await?;
    Ok(Json(indicator))
}

/// Soft-deactivate an indicator; its history stays in the annual matrix
pub async fn deactivate_indicator(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Indicator>> {
    let indicator = state
        .engine
        .deactivate_indicator(&actor, &IndicatorId::new(id), state.now())
        .await?;
    Ok(Json(indicator))
}
