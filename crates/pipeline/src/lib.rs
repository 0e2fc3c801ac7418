//! Stage orchestration for the insight pipeline.
//!
//! One run threads validated artifacts through strictly sequential
//! stages (profile, findings, strategy), each backed by either a local
//! subprocess or a hosted reasoning call. A stage's output only becomes
//! the next stage's input after it passes its schema gate; the first
//! irrecoverable failure terminates the run with all prior artifacts
//! retained.

pub mod constraints;
mod error;
mod orchestrator;
pub mod prompts;
mod report;
mod requests;
mod stage;

pub use constraints::{ConstraintReview, Constraints};
pub use error::{RunFailure, StageError};
pub use orchestrator::Orchestrator;
pub use report::{RunArtifacts, RunOutcome, RunReport, StageReport};
pub use requests::{ForecastRequest, InsightRequest};
pub use stage::{Invocation, StageName, StageSpec, StageState};
