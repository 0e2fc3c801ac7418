//! Thin client for hosted computation services.
//!
//! Same output discipline as the subprocess bridge: raw response text
//! comes back verbatim and is only trusted after the schema gate. No
//! internal retries; some capabilities consume quota and only the
//! orchestrator knows which stages are safe to re-invoke.

pub mod chat;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use palco_core::config::InsightConfig;

/// One endpoint per hosted capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Forecast,
    Segmentation,
    Pricing,
    Recommendations,
    Churn,
    Briefing,
    /// LLM chat-completions endpoint used by the reasoning stages.
    Reasoning,
}

impl Capability {
    pub fn path(&self) -> &'static str {
        match self {
            Capability::Forecast => "/forecast",
            Capability::Segmentation => "/segment",
            Capability::Pricing => "/pricing",
            Capability::Recommendations => "/recommendations",
            Capability::Churn => "/churn",
            Capability::Briefing => "/briefing_target",
            Capability::Reasoning => "/v1/chat/completions",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Surfaced before any network attempt; an empty credential is
    /// never sent.
    #[error("no API credential configured")]
    MissingCredential,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service unreachable: {0}")]
    TransportUnavailable(String),

    /// Non-success status; body carried verbatim, never swallowed.
    #[error("service rejected request: status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// 2xx envelope that does not have the expected shape.
    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("call cancelled")]
    Cancelled,
}

/// Retry/timeout-aware HTTP client for hosted stages. Configuration is
/// injected at construction so runs are reproducible under substituted
/// endpoints.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ServiceClient {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// POST `body` to the capability endpoint and return the response
    /// body text verbatim.
    pub async fn call(&self, capability: Capability, body: &Value) -> Result<String, ClientError> {
        let key = self.api_key.as_deref().ok_or(ClientError::MissingCredential)?;
        let url = format!("{}{}", self.base_url, capability.path());

        debug!(url = %url, "calling hosted capability");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {key}"))
            .header("Content-Type", "application/json")
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.timeout)
                } else {
                    ClientError::TransportUnavailable(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        // The per-request timeout also covers body reads.
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout)
            } else {
                ClientError::TransportUnavailable(e.to_string())
            }
        })?;

        if !(200..300).contains(&status) {
            return Err(ClientError::RemoteRejected { status, body: text });
        }
        Ok(text)
    }

    /// [`call`](Self::call), torn down when the run's cancellation
    /// token fires. Dropping the in-flight future aborts the request.
    pub async fn call_cancellable(
        &self,
        capability: Capability,
        body: &Value,
        cancel: &CancellationToken,
    ) -> Result<String, ClientError> {
        tokio::select! {
            result = self.call(capability, body) => result,
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
        }
    }
}
