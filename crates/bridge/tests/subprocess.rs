//! Subprocess bridge behavior against real `sh` invocations.

use std::io::Write;
use std::time::Duration;

use palco_bridge::{BridgeError, CommandRef, CompletionStatus, InputPayload, SubprocessBridge};
use tokio_util::sync::CancellationToken;

fn sh(script: &str) -> CommandRef {
    CommandRef::new("sh").arg("-c").arg(script)
}

fn bridge() -> SubprocessBridge {
    SubprocessBridge::new(Duration::from_secs(10))
}

#[tokio::test]
async fn captures_primary_channel_on_success() {
    let output = bridge()
        .invoke(
            &sh(r#"echo '{"ok": true}'"#),
            &InputPayload::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.status, CompletionStatus::Success);
    assert_eq!(output.primary.trim(), r#"{"ok": true}"#);
    assert!(output.diagnostics.is_empty());
}

#[tokio::test]
async fn diagnostics_attached_verbatim_on_failure() {
    let err = bridge()
        .invoke(
            &sh("printf 'missing column: sold_tickets' >&2; exit 1"),
            &InputPayload::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        BridgeError::ComputationFailed { status, diagnostics } => {
            assert_eq!(status, CompletionStatus::Exit(1));
            assert_eq!(diagnostics, "missing column: sold_tickets");
        }
        other => panic!("expected ComputationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_primary_on_success_is_a_failure() {
    let err = bridge()
        .invoke(
            &sh("printf 'warn only' >&2; exit 0"),
            &InputPayload::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        BridgeError::ComputationFailed { status, diagnostics } => {
            assert_eq!(status, CompletionStatus::Success);
            assert_eq!(diagnostics, "warn only");
        }
        other => panic!("expected ComputationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_diagnostic_writer_never_stalls_primary() {
    // stderr keeps dribbling after stdout is done; both must be fully
    // drained before the terminal signal is honored.
    let script = r#"
        echo '{"n": 1}'
        for i in 1 2 3; do printf "d$i" >&2; sleep 0.1; done
    "#;
    let output = bridge()
        .invoke(&sh(script), &InputPayload::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.primary.trim(), r#"{"n": 1}"#);
    assert_eq!(output.diagnostics, "d1d2d3");
}

#[tokio::test]
async fn payload_args_are_appended_to_argv() {
    let output = bridge()
        .invoke(
            &CommandRef::new("sh").arg("-c").arg(r#"echo "$0 $1""#),
            &InputPayload::args(["history.csv", "future.csv"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.primary.trim(), "history.csv future.csv");
}

#[tokio::test]
async fn stdin_payload_is_forwarded_and_closed() {
    let output = bridge()
        .invoke(
            &sh("cat"),
            &InputPayload { args: vec![], stdin: Some("{\"ctx\": 1}".to_string()) },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.primary, "{\"ctx\": 1}");
}

#[tokio::test]
async fn missing_program_is_transport_unavailable() {
    let err = bridge()
        .invoke(
            &CommandRef::new("/nonexistent/profiler"),
            &InputPayload::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::TransportUnavailable(_)));
}

#[tokio::test]
async fn timeout_kills_the_child() {
    let bridge = SubprocessBridge::new(Duration::from_millis(200));
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("survived");

    let script = format!("sleep 2 && touch {}", marker.display());
    let err = bridge
        .invoke(&sh(&script), &InputPayload::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout(_)));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!marker.exists(), "timed-out child kept running");
}

#[tokio::test]
async fn unread_stdin_payload_cannot_outlive_the_timeout() {
    // Payload well past the pipe buffer, child never reads it. The
    // deadline must still win, with the right error kind.
    let bridge = SubprocessBridge::new(Duration::from_millis(200));
    let payload = InputPayload { args: vec![], stdin: Some("x".repeat(4 * 1024 * 1024)) };

    let started = std::time::Instant::now();
    let err = bridge
        .invoke(&sh("sleep 3"), &payload, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout(_)), "expected Timeout, got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2), "invocation blocked past the deadline");
}

#[tokio::test]
async fn cancellation_kills_the_child() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = bridge()
        .invoke(&sh("sleep 5; echo done"), &InputPayload::default(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Cancelled));
}

#[tokio::test]
async fn runs_scripts_from_temp_files() {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    writeln!(script, "echo '{{\"from\": \"file\"}}'").unwrap();

    let command = CommandRef::new("sh").arg(script.path().to_string_lossy());
    let output = bridge()
        .invoke(&command, &InputPayload::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.primary.trim(), "{\"from\": \"file\"}");
}
