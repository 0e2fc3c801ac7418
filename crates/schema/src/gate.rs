//! The validation gate: structural walk, typed deserialize, semantic checks.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::descriptor::{check_value, Schema};

/// One violated expectation at a specific field path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "$" } else { &self.path };
        write!(f, "{}: expected {}, got {}", path, self.expected, self.actual)
    }
}

/// Complete list of everything wrong with a raw value. Never carries a
/// partial artifact: validation either yields a typed value or this.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("{} validation violation(s): {}", violations.len(), summary(violations))]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// An artifact type that declares its own schema gate.
pub trait Validate: DeserializeOwned {
    fn schema() -> Schema;

    /// Checks beyond pure shape (monotonic percentiles, positive
    /// timeboxes). Runs only after structural validation passed.
    fn semantic_violations(&self) -> Vec<Violation> {
        Vec::new()
    }
}

/// Run the full gate over a raw parsed value.
///
/// Pure and side-effect-free: re-validating an accepted artifact's
/// serialized form always succeeds.
pub fn validate<T: Validate>(raw: &Value) -> Result<T, ValidationFailure> {
    let mut violations = Vec::new();
    check_value(raw, &T::schema(), "", &mut violations);
    if !violations.is_empty() {
        return Err(ValidationFailure { violations });
    }

    // The structural walk guarantees this deserialize succeeds for a
    // well-declared schema; a mismatch between the two is still reported
    // as a violation rather than a panic.
    let typed: T = serde_json::from_value(raw.clone()).map_err(|e| ValidationFailure {
        violations: vec![Violation {
            path: String::new(),
            expected: "artifact-shaped value".to_string(),
            actual: e.to_string(),
        }],
    })?;

    let semantic = typed.semantic_violations();
    if !semantic.is_empty() {
        return Err(ValidationFailure { violations: semantic });
    }
    Ok(typed)
}
