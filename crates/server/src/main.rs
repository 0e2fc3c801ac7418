//! palco-server — HTTP surface for forecast and insight pipeline runs.
//!
//! # Usage
//!
//! ```bash
//! # Serve the API (default)
//! palco-server serve
//!
//! # One-shot forecast run, report printed as JSON
//! palco-server forecast data/history.csv data/future.csv
//!
//! # One-shot insight run
//! palco-server insight "fill the Saturday show" data/customers.csv
//! ```

mod api;
mod router;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use palco_core::Config;
use palco_pipeline::{ForecastRequest, InsightRequest, Orchestrator};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    palco_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("forecast") => forecast(config, &args[1..]).await,
        Some("insight") => insight(config, &args[1..]).await,
        Some(other) => {
            anyhow::bail!("unknown command: {other} (expected serve | forecast | insight)")
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config));
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("palco server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn forecast(config: Config, args: &[String]) -> anyhow::Result<()> {
    let request = ForecastRequest {
        history: args
            .first()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.forecast.history_default()),
        future: args
            .get(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| config.forecast.future_default()),
    };

    let orchestrator = Orchestrator::new(&config);
    let report = orchestrator.run_forecast(&request, &CancellationToken::new()).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    anyhow::ensure!(report.succeeded(), "forecast run failed");
    Ok(())
}

async fn insight(config: Config, args: &[String]) -> anyhow::Result<()> {
    let objective = args.first().context("usage: insight <objective> <dataset>")?;
    let dataset = args.get(1).context("usage: insight <objective> <dataset>")?;

    let request = InsightRequest {
        objective: objective.clone(),
        dataset: PathBuf::from(dataset),
        constraints: Default::default(),
    };

    let orchestrator = Orchestrator::new(&config);
    let report = orchestrator.run_insight(&request, &CancellationToken::new()).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    anyhow::ensure!(report.succeeded(), "insight run failed");
    Ok(())
}
