//! Stage declarations: names, lifecycle states, invocation strategies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use palco_bridge::{CommandRef, InputPayload};
use palco_client::chat::ChatMessage;
use palco_client::Capability;
use palco_core::ArtifactKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Profile,
    Findings,
    Strategy,
    Forecast,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageName::Profile => write!(f, "profile"),
            StageName::Findings => write!(f, "findings"),
            StageName::Strategy => write!(f, "strategy"),
            StageName::Forecast => write!(f, "forecast"),
        }
    }
}

/// Stage lifecycle. A stage either walks the full chain to `Completed`
/// or drops to `Failed` from whichever step broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Invoking,
    ParsingOutput,
    Validating,
    Completed,
    Failed,
}

/// The closed set of invocation strategies a stage can be backed by.
/// The orchestrator consumes all of them identically: one primary text
/// channel out, parsed and validated before anything trusts it.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Local subprocess via the computation bridge.
    Subprocess { command: CommandRef, input: InputPayload },
    /// Hosted capability call; the response body is the primary channel.
    /// No shipped stage is backed by this yet; the built-in pipelines
    /// use [`Subprocess`](Invocation::Subprocess) and
    /// [`Reasoning`](Invocation::Reasoning). It stays in the closed set
    /// so a stage can move to a hosted endpoint without a new seam.
    Hosted { capability: Capability, body: Value },
    /// Hosted reasoning call wrapped in the chat-completions envelope;
    /// the assistant message text is the primary channel.
    Reasoning { messages: Vec<ChatMessage> },
}

#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: StageName,
    pub produces: ArtifactKind,
    /// Only transport/timeout failures on retryable stages are ever
    /// re-attempted. Reasoning stages consume quota and stay at one
    /// attempt.
    pub retryable: bool,
    pub invocation: Invocation,
}
