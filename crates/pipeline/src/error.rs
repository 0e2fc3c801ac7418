//! Mapping of layer failures into the shared error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use palco_bridge::BridgeError;
use palco_client::ClientError;
use palco_core::ErrorKind;
use palco_schema::ValidationFailure;

use crate::stage::StageName;

/// One stage's failure: the taxonomy kind, a human-readable message and
/// the raw diagnostics (external stderr text, rejected response body,
/// or the full violation list). Diagnostics are never truncated.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
    pub diagnostics: String,
}

impl StageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), diagnostics: String::new() }
    }

    pub fn with_diagnostics(mut self, diagnostics: impl Into<String>) -> Self {
        self.diagnostics = diagnostics.into();
        self
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "run cancelled by caller")
    }
}

impl From<BridgeError> for StageError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::TransportUnavailable(msg) => {
                Self::new(ErrorKind::TransportUnavailable, msg)
            }
            BridgeError::ComputationFailed { status, diagnostics } => {
                Self::new(ErrorKind::ComputationFailed, format!("computation ended with {status}"))
                    .with_diagnostics(diagnostics)
            }
            BridgeError::Timeout(after) => {
                Self::new(ErrorKind::Timeout, format!("no terminal signal within {after:?}"))
            }
            BridgeError::Cancelled => Self::cancelled(),
        }
    }
}

impl From<ClientError> for StageError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::MissingCredential => {
                Self::new(ErrorKind::MissingCredential, "no API credential configured")
            }
            ClientError::Timeout(after) => {
                Self::new(ErrorKind::Timeout, format!("no response within {after:?}"))
            }
            ClientError::TransportUnavailable(msg) => {
                Self::new(ErrorKind::TransportUnavailable, msg)
            }
            ClientError::RemoteRejected { status, body } => {
                Self::new(ErrorKind::RemoteRejected, format!("service returned status {status}"))
                    .with_diagnostics(body)
            }
            ClientError::MalformedResponse(msg) => Self::new(ErrorKind::MalformedOutput, msg),
            ClientError::Cancelled => Self::cancelled(),
        }
    }
}

impl From<ValidationFailure> for StageError {
    fn from(err: ValidationFailure) -> Self {
        let message = format!("{} schema violation(s)", err.violations.len());
        Self::new(ErrorKind::SchemaViolation, message).with_diagnostics(err.to_string())
    }
}

/// The structured error object a failed run exposes to callers:
/// `{ stage, error_kind, message, diagnostics }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    pub stage: StageName,
    pub error_kind: ErrorKind,
    pub message: String,
    pub diagnostics: String,
}

impl RunFailure {
    pub fn new(stage: StageName, error: StageError) -> Self {
        Self {
            stage,
            error_kind: error.kind,
            message: error.message,
            diagnostics: error.diagnostics,
        }
    }
}
