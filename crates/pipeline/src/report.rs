//! Per-run report: stage trace, retained artifacts, failure detail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use palco_core::{ArtifactKind, DataProfile, Findings, ForecastReport, Strategy};

use crate::constraints::ConstraintReview;
use crate::error::RunFailure;
use crate::stage::{StageName, StageSpec, StageState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

/// Trace of one stage's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub name: StageName,
    pub produces: ArtifactKind,
    pub state: StageState,
    pub attempts: u32,
    pub duration_ms: u64,
}

impl StageReport {
    pub fn pending(spec: &StageSpec) -> Self {
        Self {
            name: spec.name,
            produces: spec.produces,
            state: StageState::Pending,
            attempts: 0,
            duration_ms: 0,
        }
    }
}

/// Every artifact the run validated. On failure these are the partial
/// progress: completed stages stay populated so a caller never has to
/// discard valid intermediate work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub profile: Option<DataProfile>,
    pub findings: Option<Findings>,
    pub strategies: Vec<Strategy>,
    pub forecast: Option<ForecastReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    pub stages: Vec<StageReport>,
    pub artifacts: RunArtifacts,
    pub strategy_reviews: Vec<ConstraintReview>,
    pub failure: Option<RunFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }
}
