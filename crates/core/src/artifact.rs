//! Validated artifact types threaded through the insight pipeline.
//!
//! Each artifact is immutable once it has passed its schema gate: the
//! orchestrator only ever hands `Completed` artifacts to the next stage
//! or to the presentation layer. Raw external output never appears here;
//! it stays a `serde_json::Value` until validation converts it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── DataProfile ───────────────────────────────────────────────────

/// Profile of a customer/event population, produced once per insight run.
/// Sole input to the findings stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProfile {
    pub population: Population,
    pub quality: Quality,
    /// Null when the population is too small for stable percentiles.
    pub rfm_percentiles: Option<RfmPercentiles>,
    pub behavior: Behavior,
    pub music: MusicProfile,
    /// Free-form echo of the source queries; passes through unvalidated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_queries: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub n_customers: u64,
    pub period_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    pub missing_pct: f64,
    pub outliers_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmPercentiles {
    #[serde(rename = "R")]
    pub r: PercentileTriple,
    #[serde(rename = "F")]
    pub f: PercentileTriple,
    #[serde(rename = "M")]
    pub m: PercentileTriple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileTriple {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub avg_days_between: Option<f64>,
    pub seasonality_hint: SeasonalityHint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityHint {
    None,
    Monthly,
    Weekly,
    EventDriven,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicProfile {
    pub top_genres: Vec<GenreShare>,
    /// Pairs of genres the same customers attend.
    pub cross_affinities: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreShare {
    pub name: String,
    pub share_pct: f64,
}

// ── Findings ──────────────────────────────────────────────────────

/// Evidence-backed observations derived from a [`DataProfile`].
/// Input to the strategy stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    pub key_segments: Vec<KeySegment>,
    pub opportunities: Vec<Opportunity>,
    pub risks: Vec<Risk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySegment {
    pub name: String,
    pub size: u64,
    pub rfm: PartialRfm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<Vec<String>>,
    pub evidence: Vec<String>,
}

/// Partial RFM summary; any axis may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialRfm {
    #[serde(rename = "R", skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(rename = "F", skip_serializing_if = "Option::is_none")]
    pub f: Option<f64>,
    #[serde(rename = "M", skip_serializing_if = "Option::is_none")]
    pub m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub hypothesis: String,
    pub evidence: Vec<String>,
    pub est_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub desc: String,
    pub evidence: Vec<String>,
}

// ── Strategy ──────────────────────────────────────────────────────

/// One recommended action. A run may produce zero or more, each
/// independently validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub title: String,
    pub target_segment: String,
    pub channel: Vec<String>,
    pub offer: Offer,
    pub timing: Timing,
    pub kpi: Kpi,
    pub rationale: Vec<String>,
    pub constraints_check: ConstraintsCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_uplift: Option<PredictedUplift>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub start_rule: String,
    pub cadence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub metric: String,
    pub goal: String,
    pub timebox_days: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintsCheck {
    pub capacity_ok: bool,
    pub margin_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedUplift {
    pub method: String,
    pub value_pct: f64,
}

// ── ForecastReport ────────────────────────────────────────────────

/// Output contract of the trained forecast model: one JSON document on
/// stdout with metrics, per-event predictions and a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub metrics: ForecastMetrics,
    pub forecast: Vec<Value>,
    pub summary: ForecastSummary,
}

/// Holdout metrics. Every key must be present; each is null when the
/// holdout split was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub tickets_r2: Option<f64>,
    pub tickets_mae: Option<f64>,
    pub revenue_r2: Option<f64>,
    pub revenue_mae: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_events: u64,
    pub sum_pred_tickets: u64,
    pub sum_pred_revenue: f64,
    pub top5_by_revenue: Vec<Value>,
}

// ── Stage → artifact mapping ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Profile,
    Findings,
    Strategy,
    Forecast,
}
