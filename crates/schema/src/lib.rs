//! Schema gate for untrusted external output.
//!
//! Raw computation output stays a generic `serde_json::Value` until it
//! passes through [`validate`], which runs a structural walk, a typed
//! deserialize, and artifact-specific semantic checks. Every violation
//! is collected before failing; nothing short-circuits.

pub mod artifacts;
mod descriptor;
mod gate;

pub use artifacts::segment_bounds;
pub use descriptor::{Field, Schema};
pub use gate::{validate, Validate, ValidationFailure, Violation};
