//! The stage orchestrator: sequential stage execution, bounded retry,
//! partial-progress retention.

use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use palco_bridge::{CommandRef, InputPayload, SubprocessBridge};
use palco_client::{chat, ServiceClient};
use palco_core::config::{Config, ForecastConfig, InsightConfig};
use palco_core::{
    ArtifactKind, DataProfile, ErrorKind, Findings, ForecastReport, Strategy,
};
use palco_schema::{segment_bounds, validate, ValidationFailure, Violation};

use crate::constraints;
use crate::error::{RunFailure, StageError};
use crate::prompts;
use crate::report::{RunArtifacts, RunOutcome, RunReport, StageReport};
use crate::requests::{ForecastRequest, InsightRequest};
use crate::stage::{Invocation, StageName, StageSpec, StageState};

/// Sequences stages for one pipeline run. Holds no mutable state:
/// methods take `&self`, so independent runs execute concurrently, each
/// owning its own artifacts and invocations.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    bridge: SubprocessBridge,
    client: ServiceClient,
    forecast: ForecastConfig,
    insight: InsightConfig,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(config.forecast.clone(), config.insight.clone())
    }

    pub fn from_parts(forecast: ForecastConfig, insight: InsightConfig) -> Self {
        Self {
            bridge: SubprocessBridge::new(forecast.timeout()),
            client: ServiceClient::new(&insight),
            forecast,
            insight,
        }
    }

    /// Single-stage forecast run: trained model subprocess over a
    /// history/future dataset pair.
    pub async fn run_forecast(
        &self,
        request: &ForecastRequest,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut run = RunState::new();
        info!(run_id = %run.run_id, history = %request.history.display(), "starting forecast run");

        let spec = StageSpec {
            name: StageName::Forecast,
            produces: ArtifactKind::Forecast,
            retryable: true,
            invocation: Invocation::Subprocess {
                command: self.python(&self.forecast.model_script),
                input: InputPayload::args([
                    request.history.to_string_lossy(),
                    request.future.to_string_lossy(),
                ]),
            },
        };

        let report: ForecastReport =
            match self.run_stage(&spec, cancel, &mut run, |value| {
                validate(value).map_err(StageError::from)
            })
            .await
            {
                Ok(report) => report,
                Err(error) => return run.fail(spec.name, error),
            };

        run.artifacts.forecast = Some(report);
        run.succeed()
    }

    /// Three-stage insight run: profile the dataset, derive findings,
    /// recommend strategies. Stage N never starts before stage N-1
    /// completed its gate.
    pub async fn run_insight(
        &self,
        request: &InsightRequest,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut run = RunState::new();
        info!(run_id = %run.run_id, objective = %request.objective, "starting insight run");

        // Stage 1: profile the dataset via the local profiler.
        let spec = StageSpec {
            name: StageName::Profile,
            produces: ArtifactKind::Profile,
            retryable: true,
            invocation: Invocation::Subprocess {
                command: self.python(&self.forecast.profile_script),
                input: InputPayload::args([request.dataset.to_string_lossy()]),
            },
        };
        let profile: DataProfile =
            match self.run_stage(&spec, cancel, &mut run, |value| {
                validate(value).map_err(StageError::from)
            })
            .await
            {
                Ok(profile) => profile,
                Err(error) => return run.fail(spec.name, error),
            };
        run.artifacts.profile = Some(profile.clone());

        // Stage 2: findings from the analyst persona. Non-retryable:
        // reasoning calls consume quota.
        let spec = StageSpec {
            name: StageName::Findings,
            produces: ArtifactKind::Findings,
            retryable: false,
            invocation: Invocation::Reasoning {
                messages: prompts::findings_messages(&request.objective, &profile),
            },
        };
        let findings: Findings =
            match self.run_stage(&spec, cancel, &mut run, |value| {
                let findings: Findings = validate(value)?;
                // Cross-artifact gate: segment sizes against the profile.
                let violations = segment_bounds(&findings, &profile);
                if !violations.is_empty() {
                    return Err(ValidationFailure { violations }.into());
                }
                Ok(findings)
            })
            .await
            {
                Ok(findings) => findings,
                Err(error) => return run.fail(spec.name, error),
            };
        run.artifacts.findings = Some(findings.clone());

        // Stage 3: strategies from the strategist persona.
        let spec = StageSpec {
            name: StageName::Strategy,
            produces: ArtifactKind::Strategy,
            retryable: false,
            invocation: Invocation::Reasoning {
                messages: prompts::strategy_messages(
                    &request.objective,
                    &findings,
                    &request.constraints,
                ),
            },
        };
        let strategies: Vec<Strategy> =
            match self.run_stage(&spec, cancel, &mut run, validate_strategies).await {
                Ok(strategies) => strategies,
                Err(error) => return run.fail(spec.name, error),
            };

        run.strategy_reviews = strategies
            .iter()
            .map(|s| constraints::review(s, &request.constraints))
            .collect();
        run.artifacts.strategies = strategies;
        run.succeed()
    }

    fn python(&self, script: &std::path::Path) -> CommandRef {
        CommandRef::new(&self.forecast.python_bin).arg(script.to_string_lossy())
    }

    /// Drive one stage through its lifecycle: invoke (with bounded
    /// retry on transient failures), parse, validate.
    async fn run_stage<T>(
        &self,
        spec: &StageSpec,
        cancel: &CancellationToken,
        run: &mut RunState,
        validate_value: impl FnOnce(&Value) -> Result<T, StageError>,
    ) -> Result<T, StageError> {
        let mut report = StageReport::pending(spec);

        if cancel.is_cancelled() {
            report.state = StageState::Failed;
            run.stages.push(report);
            return Err(StageError::cancelled());
        }

        let started = Instant::now();
        let result = self.produce_parsed(spec, cancel, &mut report).await.and_then(|value| {
            report.state = StageState::Validating;
            validate_value(&value)
        });
        report.duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(artifact) => {
                report.state = StageState::Completed;
                debug!(stage = %spec.name, attempts = report.attempts, "stage completed");
                run.stages.push(report);
                Ok(artifact)
            }
            Err(error) => {
                report.state = StageState::Failed;
                warn!(stage = %spec.name, kind = %error.kind, "stage failed: {}", error.message);
                run.stages.push(report);
                Err(error)
            }
        }
    }

    /// Invoke the stage backend until it yields a primary channel, then
    /// parse it into a generic structural value. Validation never runs
    /// on unparsable input.
    async fn produce_parsed(
        &self,
        spec: &StageSpec,
        cancel: &CancellationToken,
        report: &mut StageReport,
    ) -> Result<Value, StageError> {
        let max_attempts = if spec.retryable { self.insight.max_attempts.max(1) } else { 1 };

        let primary = loop {
            report.attempts += 1;
            report.state = StageState::Invoking;

            let attempt = match &spec.invocation {
                Invocation::Subprocess { command, input } => self
                    .bridge
                    .invoke(command, input, cancel)
                    .await
                    .map(|raw| raw.primary)
                    .map_err(StageError::from),
                Invocation::Hosted { capability, body } => self
                    .client
                    .call_cancellable(*capability, body, cancel)
                    .await
                    .map_err(StageError::from),
                Invocation::Reasoning { messages } => {
                    chat::complete(&self.client, messages, cancel)
                        .await
                        .map_err(StageError::from)
                }
            };

            match attempt {
                Ok(primary) => break primary,
                Err(error)
                    if error.kind.is_transient()
                        && spec.retryable
                        && report.attempts < max_attempts =>
                {
                    warn!(
                        stage = %spec.name,
                        attempt = report.attempts,
                        kind = %error.kind,
                        "transient stage failure, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        };

        report.state = StageState::ParsingOutput;
        serde_json::from_str(&primary).map_err(|e| {
            StageError::new(
                ErrorKind::MalformedOutput,
                format!("primary channel is not valid JSON: {e}"),
            )
            .with_diagnostics(primary)
        })
    }
}

/// Strategy-stage gate: the reasoning output arrives as
/// `{"strategies": [...]}` and every element must pass independently.
/// All violations across all elements are collected before failing.
fn validate_strategies(value: &Value) -> Result<Vec<Strategy>, StageError> {
    let items = match value.get("strategies").and_then(Value::as_array) {
        Some(items) => items,
        None => {
            return Err(ValidationFailure {
                violations: vec![Violation {
                    path: "strategies".to_string(),
                    expected: "array of strategy objects".to_string(),
                    actual: "missing".to_string(),
                }],
            }
            .into())
        }
    };

    let mut strategies = Vec::with_capacity(items.len());
    let mut violations = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match validate::<Strategy>(item) {
            Ok(strategy) => strategies.push(strategy),
            Err(failure) => violations.extend(failure.violations.into_iter().map(|v| {
                Violation {
                    path: if v.path.is_empty() {
                        format!("strategies[{i}]")
                    } else {
                        format!("strategies[{i}].{}", v.path)
                    },
                    ..v
                }
            })),
        }
    }

    if !violations.is_empty() {
        return Err(ValidationFailure { violations }.into());
    }
    Ok(strategies)
}

/// Per-run accumulator. Owned by a single run; never shared.
struct RunState {
    run_id: Uuid,
    started_at: chrono::DateTime<Utc>,
    stages: Vec<StageReport>,
    artifacts: RunArtifacts,
    strategy_reviews: Vec<constraints::ConstraintReview>,
}

impl RunState {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            stages: Vec::new(),
            artifacts: RunArtifacts::default(),
            strategy_reviews: Vec::new(),
        }
    }

    fn succeed(self) -> RunReport {
        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            outcome: RunOutcome::Succeeded,
            stages: self.stages,
            artifacts: self.artifacts,
            strategy_reviews: self.strategy_reviews,
            failure: None,
        }
    }

    /// Completed artifacts are always retained alongside the failure.
    fn fail(self, stage: StageName, error: StageError) -> RunReport {
        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            outcome: RunOutcome::Failed,
            stages: self.stages,
            artifacts: self.artifacts,
            strategy_reviews: self.strategy_reviews,
            failure: Some(RunFailure::new(stage, error)),
        }
    }
}
