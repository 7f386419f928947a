//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Monthly grid
        .route("/grid", get(handlers::get_grid))
        .route("/grid/save", post(handlers::save_grid))
        // Submissions
        .route(
            "/submissions/:process_id/:year/:month",
            get(handlers::get_submission),
        )
        .route(
            "/submissions/:process_id/:year/:month/submit",
            post(handlers::submit_submission),
        )
        .route(
            "/submissions/:process_id/:year/:month/validate",
            post(handlers::validate_submission),
        )
        .route(
            "/submissions/:process_id/:year/:month/reject",
            post(handlers::reject_submission),
        )
        .route(
            "/submissions/:process_id/:year/:month/audit",
            get(handlers::get_audit_trail),
        )
        // Annual matrix
        .route("/matrix", get(handlers::get_matrix))
        // Catalog
        .route("/catalog/processes", get(handlers::list_processes))
        .route("/catalog/processes", post(handlers::create_process))
        .route("/catalog/indicators", get(handlers::list_indicators))
        .route("/catalog/indicators", post(handlers::create_indicator))
        .route("/catalog/indicators/:id", put(handlers::update_indicator))
        .route(
            "/catalog/indicators/:id/deactivate",
            post(handlers::deactivate_indicator),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS for browser front-ends served from another origin
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
