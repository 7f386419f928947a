//! Annual matrix handler

use crate::api::rest::caller::Caller;
use crate::api::rest::extract::ApiQuery;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use kpi_types::{ProcessId, ProcessMatrix};
use serde::{Deserialize, Serialize};

/// Matrix query; the year defaults to the current one
#[derive(Debug, Deserialize)]
pub struct MatrixQuery {
    pub process_id: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct MatrixResponse {
    pub year: i32,
    pub processes: Vec<ProcessMatrix>,
}

pub async fn get_matrix(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiQuery(query): ApiQuery<MatrixQuery>,
) -> ApiResult<Json<MatrixResponse>> {
    let year = match query.year {
        Some(year) => year,
        None => state.engine.period_clock().current_period(state.now()).year(),
    };
    let process_id = query.process_id.map(ProcessId::new);

    let processes = state
        .engine
        .annual_matrix(&actor, process_id.as_ref(), year)
        .await?;

    Ok(Json(MatrixResponse { year, processes }))
}
