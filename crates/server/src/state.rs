//! Shared application state.

use palco_core::Config;
use palco_pipeline::Orchestrator;

/// Built once at startup, shared behind an `Arc`. The orchestrator is
/// stateless; concurrent requests run their pipelines independently.
pub struct AppState {
    pub config: Config,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let orchestrator = Orchestrator::new(&config);
        Self { config, orchestrator }
    }
}
