//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/config", get(api::config_summary))
        .route("/api/forecast", post(api::run_forecast))
        .route("/api/insight/run", post(api::run_insight))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
