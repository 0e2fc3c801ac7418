//! One external computation invocation, raw output back.
//!
//! The bridge spawns a subprocess, feeds it its input, drains both
//! output channels independently and converts the terminal signal into
//! either [`RawComputationOutput`] or a typed [`BridgeError`]. It knows
//! nothing about business semantics and never retries; retry policy
//! belongs to the orchestrator.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Reference to an external computation unit.
#[derive(Debug, Clone)]
pub struct CommandRef {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandRef {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), working_dir: None }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Per-invocation input: dataset locations go on argv, structured
/// context goes to stdin.
#[derive(Debug, Clone, Default)]
pub struct InputPayload {
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl InputPayload {
    pub fn args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { args: args.into_iter().map(Into::into).collect(), stdin: None }
    }
}

/// Terminal signal of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Success,
    Exit(i32),
    /// Terminated by a signal, no exit code available.
    Killed,
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionStatus::Success => write!(f, "exit 0"),
            CompletionStatus::Exit(code) => write!(f, "exit {code}"),
            CompletionStatus::Killed => write!(f, "killed"),
        }
    }
}

/// Uninterpreted result of one invocation. Ephemeral: the orchestrator
/// parses `primary` and drops this.
#[derive(Debug, Clone)]
pub struct RawComputationOutput {
    pub primary: String,
    pub diagnostics: String,
    pub status: CompletionStatus,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("could not start computation: {0}")]
    TransportUnavailable(String),

    /// Non-success terminal signal, or success with an empty primary
    /// channel. Diagnostics carried verbatim, untruncated.
    #[error("computation failed ({status}): {diagnostics}")]
    ComputationFailed {
        status: CompletionStatus,
        diagnostics: String,
    },

    #[error("computation timed out after {0:?}")]
    Timeout(Duration),

    #[error("computation cancelled")]
    Cancelled,
}

/// Bridge backed by a local subprocess.
#[derive(Debug, Clone)]
pub struct SubprocessBridge {
    timeout: Duration,
}

impl SubprocessBridge {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one invocation to its terminal signal.
    ///
    /// Both output channels are accumulated by independent tasks, so a
    /// slow diagnostic writer never stalls capture of the primary
    /// channel. Timeout and cancellation kill the child before
    /// returning; no orphaned process survives this call.
    pub async fn invoke(
        &self,
        command: &CommandRef,
        payload: &InputPayload,
        cancel: &CancellationToken,
    ) -> Result<RawComputationOutput, BridgeError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .args(&payload.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(if payload.stdin.is_some() { Stdio::piped() } else { Stdio::null() });

        debug!(program = %command.program, args = ?command.args, "invoking computation");

        let mut child = cmd
            .spawn()
            .map_err(|e| BridgeError::TransportUnavailable(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::TransportUnavailable("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BridgeError::TransportUnavailable("stderr not captured".into()))?;

        let primary_task = tokio::spawn(drain(stdout));
        let diagnostics_task = tokio::spawn(drain(stderr));

        // Forwarding stdin runs as its own task; a child that never
        // reads its input must not hold the invocation past the
        // deadline, so the write races the same timeout/cancellation
        // as the wait below. A broken pipe only means the child exited
        // without consuming its input.
        if let Some(text) = &payload.stdin {
            let mut sink = child
                .stdin
                .take()
                .ok_or_else(|| BridgeError::TransportUnavailable("stdin not captured".into()))?;
            let text = text.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.write_all(text.as_bytes()).await {
                    debug!("stdin write ended early: {e}");
                }
                // Dropping the handle closes the pipe so the child sees EOF.
            });
        }

        let exit = tokio::select! {
            status = child.wait() => {
                status.map_err(|e| BridgeError::TransportUnavailable(e.to_string()))?
            }
            _ = tokio::time::sleep(self.timeout) => {
                warn!(program = %command.program, timeout = ?self.timeout, "computation timed out");
                kill(&mut child).await;
                return Err(BridgeError::Timeout(self.timeout));
            }
            _ = cancel.cancelled() => {
                debug!(program = %command.program, "invocation cancelled by caller");
                kill(&mut child).await;
                return Err(BridgeError::Cancelled);
            }
        };

        // Both channels must be fully drained before the terminal signal
        // is honored.
        let primary = join_drain(primary_task).await?;
        let diagnostics = join_drain(diagnostics_task).await?;

        let status = if exit.success() {
            CompletionStatus::Success
        } else {
            exit.code().map(CompletionStatus::Exit).unwrap_or(CompletionStatus::Killed)
        };

        match status {
            CompletionStatus::Success if !primary.trim().is_empty() => {
                Ok(RawComputationOutput { primary, diagnostics, status })
            }
            // Exit 0 with nothing on the primary channel is still a failure.
            _ => Err(BridgeError::ComputationFailed { status, diagnostics }),
        }
    }
}

async fn drain<R: AsyncReadExt + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).await?;
    Ok(buf)
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("failed to kill child process: {e}");
    }
}

async fn join_drain(
    task: tokio::task::JoinHandle<std::io::Result<String>>,
) -> Result<String, BridgeError> {
    task.await
        .map_err(|e| BridgeError::TransportUnavailable(format!("reader task failed: {e}")))?
        .map_err(|e| BridgeError::TransportUnavailable(e.to_string()))
}
