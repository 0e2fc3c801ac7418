//! Chat-completions envelope for the reasoning capability.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::{Capability, ClientError, ServiceClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Send a chat completion and return the assistant's message text.
///
/// The response format is pinned to a JSON object so the stage output
/// can go straight to the parse step.
pub async fn complete(
    client: &ServiceClient,
    messages: &[ChatMessage],
    cancel: &CancellationToken,
) -> Result<String, ClientError> {
    let body = json!({
        "model": client.model(),
        "messages": messages,
        "temperature": client.temperature(),
        "max_tokens": client.max_tokens(),
        "response_format": { "type": "json_object" },
    });

    let text = client.call_cancellable(Capability::Reasoning, &body, cancel).await?;

    let envelope: Value = serde_json::from_str(&text)
        .map_err(|e| ClientError::MalformedResponse(format!("response is not JSON: {e}")))?;
    envelope["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ClientError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}
