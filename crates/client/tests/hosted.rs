//! Hosted capability calls against a mock HTTP server.

use std::io::Write;
use std::time::Duration;

use palco_client::{chat, Capability, ClientError, ServiceClient};
use palco_core::config::InsightConfig;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn config_for(base_url: &str) -> InsightConfig {
    InsightConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-key".to_string()),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.7,
        max_tokens: 2048,
        timeout_secs: 2,
        max_attempts: 2,
    }
}

#[tokio::test]
async fn returns_response_body_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/segment")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_body(r#"{"segments": []}"#)
        .create_async()
        .await;

    let client = ServiceClient::new(&config_for(&server.url()));
    let body = client
        .call(Capability::Segmentation, &json!({"k": 4}))
        .await
        .unwrap();

    assert_eq!(body, r#"{"segments": []}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_carries_body_verbatim() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/pricing")
        .with_status(500)
        .with_body("quota exhausted for tenant 42")
        .create_async()
        .await;

    let client = ServiceClient::new(&config_for(&server.url()));
    let err = client.call(Capability::Pricing, &json!({})).await.unwrap_err();

    match err {
        ClientError::RemoteRejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "quota exhausted for tenant 42");
        }
        other => panic!("expected RemoteRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/churn")
        .expect(0)
        .create_async()
        .await;

    let mut config = config_for(&server.url());
    config.api_key = None;
    let client = ServiceClient::new(&config);

    let err = client.call(Capability::Churn, &json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingCredential));
    mock.assert_async().await;
}

#[tokio::test]
async fn slow_response_maps_to_timeout() {
    // Bypass the mockito server pool: the blocking sleep in the chunked
    // body keeps the server's runtime thread busy past the end of this
    // test, which would starve whichever test reuses the pooled server.
    let mut server = mockito::Server::new_with_opts_async(mockito::ServerOpts::default()).await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(5));
            w.write_all(b"{}")
        })
        .create_async()
        .await;

    let client = ServiceClient::new(&config_for(&server.url()));
    let err = client
        .call(Capability::Reasoning, &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_unavailable() {
    let client = ServiceClient::new(&config_for("http://127.0.0.1:9"));
    let err = client.call(Capability::Forecast, &json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::TransportUnavailable(_)));
}

#[tokio::test]
async fn cancellation_aborts_in_flight_call() {
    // Bypass the server pool; see slow_response_maps_to_timeout.
    let mut server = mockito::Server::new_with_opts_async(mockito::ServerOpts::default()).await;
    server
        .mock("POST", "/briefing_target")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(5));
            w.write_all(b"{}")
        })
        .create_async()
        .await;

    let client = ServiceClient::new(&config_for(&server.url()));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = client
        .call_cancellable(Capability::Briefing, &json!({}), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}

#[tokio::test]
async fn chat_extracts_assistant_content() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(
            json!({
                "choices": [ { "message": { "role": "assistant", "content": "{\"findings\": []}" } } ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ServiceClient::new(&config_for(&server.url()));
    let content = chat::complete(
        &client,
        &[chat::ChatMessage::system("analyst"), chat::ChatMessage::user("profile")],
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(content, "{\"findings\": []}");
}

#[tokio::test]
async fn chat_without_choices_is_malformed_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"error": null}"#)
        .create_async()
        .await;

    let client = ServiceClient::new(&config_for(&server.url()));
    let err = chat::complete(
        &client,
        &[chat::ChatMessage::user("hi")],
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ClientError::MalformedResponse(_)));
}
