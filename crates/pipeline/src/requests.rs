//! Caller-facing run requests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constraints::Constraints;

/// One insight run: profile the dataset, derive findings, recommend
/// strategies under the given constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRequest {
    pub objective: String,
    pub dataset: PathBuf,
    #[serde(default)]
    pub constraints: Constraints,
}

/// One forecast run over a history/future dataset pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub history: PathBuf,
    pub future: PathBuf,
}
