//! Health handler

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use kpi_types::Period;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub now: DateTime<Utc>,
    pub current_period: Period,
    pub window_open: bool,
    pub audit_chain_intact: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let now = state.now();
    let clock = state.engine.period_clock();
    let audit_chain_intact = state.engine.verify_audit_chain().await;

    Json(HealthCheckResponse {
        status: if audit_chain_intact { "healthy" } else { "degraded" }.to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        now,
        current_period: clock.current_period(now),
        window_open: clock.is_within_entry_window(now),
        audit_chain_intact,
    })
}
