//! HTTP handlers: health, config summary, forecast and insight runs.
//!
//! The server is a thin collaborator boundary. Pipeline semantics live
//! in `palco-pipeline`; handlers only translate between HTTP and run
//! requests/reports.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use palco_core::ForecastReport;
use palco_pipeline::{ForecastRequest, InsightRequest, RunReport};

use crate::state::AppState;

// ── Health & config ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub insight_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        insight_configured: state.config.insight.is_configured(),
    })
}

pub async fn config_summary(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config.redacted_summary())
}

// ── Forecast ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ForecastBody {
    pub history_csv_path: Option<PathBuf>,
    pub future_csv_path: Option<PathBuf>,
}

/// Run the forecast model over a dataset pair. Returns the validated
/// report body on success; a failed run maps to 502 with the
/// structured failure object.
pub async fn run_forecast(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForecastBody>,
) -> Result<Json<ForecastReport>, (StatusCode, Json<serde_json::Value>)> {
    let request = ForecastRequest {
        history: body
            .history_csv_path
            .unwrap_or_else(|| state.config.forecast.history_default()),
        future: body
            .future_csv_path
            .unwrap_or_else(|| state.config.forecast.future_default()),
    };

    for path in [&request.history, &request.future] {
        if !path.exists() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("dataset not found: {}", path.display()) })),
            ));
        }
    }

    let report = state
        .orchestrator
        .run_forecast(&request, &CancellationToken::new())
        .await;

    match (report.succeeded(), report.artifacts.forecast, report.failure) {
        (true, Some(forecast), _) => Ok(Json(forecast)),
        (_, _, Some(failure)) => Err((
            StatusCode::BAD_GATEWAY,
            Json(serde_json::to_value(&failure).unwrap_or_else(|_| json!({ "error": "forecast run failed" }))),
        )),
        _ => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "forecast run produced no artifact" })),
        )),
    }
}

// ── Insight ───────────────────────────────────────────────────────

/// Run the full insight pipeline. Always 200: the run itself completed
/// and partial progress must reach the caller even when a stage failed.
pub async fn run_insight(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InsightRequest>,
) -> Json<RunReport> {
    let report = state
        .orchestrator
        .run_insight(&request, &CancellationToken::new())
        .await;
    Json(report)
}
