use serde::{Deserialize, Serialize};

/// Failure classification shared by every layer of the pipeline.
///
/// The bridge and the service client surface a subset of these; the
/// orchestrator maps all of them into stage failures and decides which
/// kinds are worth a bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The external computation could not be started or reached.
    TransportUnavailable,
    /// No terminal signal arrived within the configured deadline.
    Timeout,
    /// The computation finished with a non-success terminal signal.
    ComputationFailed,
    /// The primary output channel is not parseable as structured data.
    MalformedOutput,
    /// Parsed output failed its schema gate.
    SchemaViolation,
    /// No credential was configured for a hosted-service call.
    MissingCredential,
    /// A hosted service answered with a non-success status.
    RemoteRejected,
    /// The caller tore down the run.
    Cancelled,
}

impl ErrorKind {
    /// Only transport-level failures are safe to re-attempt; a schema
    /// violation or a crashed computation will not improve on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::TransportUnavailable | ErrorKind::Timeout)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::TransportUnavailable => "transport_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ComputationFailed => "computation_failed",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::RemoteRejected => "remote_rejected",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
