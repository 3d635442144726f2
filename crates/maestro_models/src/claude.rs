//! Direct Claude-native protocol adapter.
//!
//! Speaks `POST {endpoint}/messages` with `x-api-key` auth and a versioned
//! protocol header. The protocol rejects system-role entries in the message
//! list, adjacent same-role turns, and conversations that do not open with a
//! user turn, so message lists are normalized before transmission.

use crate::sse::{ChunkStream, data_frames, decode_frame};
use crate::ClientConfig;
use async_stream::stream;
use futures_util::StreamExt;
use maestro_core::{Message, Role};
use maestro_error::{ClientError, ClientErrorKind, ClientResult, MaestroResult};
use maestro_interface::{FinishReason, StreamChunk};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// Protocol version header value.
const CLAUDE_VERSION: &str = "2023-06-01";

/// Fallback token ceiling; the protocol makes max_tokens mandatory.
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Synthetic opening turn when normalization would otherwise start with an
/// assistant message.
const LEADING_USER_PLACEHOLDER: &str = "Continue.";

/// Claude-native generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaudeRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate (mandatory in this protocol)
    pub max_tokens: u32,
    /// Conversation messages (no system role, no same-role adjacency)
    pub messages: Vec<ClaudeMessage>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Concatenated system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Enable streaming mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A role/content pair on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClaudeMessage {
    /// "user" or "assistant"
    pub role: String,
    /// Message content
    pub content: String,
}

/// Claude-native generation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClaudeResponse {
    /// Generated content blocks
    #[serde(default)]
    pub content: Vec<ClaudeContentBlock>,
    /// Why generation stopped
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// One content block in a response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct ClaudeContentBlock {
    /// Block type ("text")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Block text
    #[serde(default)]
    pub text: Option<String>,
}

/// One streaming event frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClaudeStreamEvent {
    /// Event type ("content_block_delta", "message_stop", ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Delta payload for content_block_delta events
    #[serde(default)]
    pub delta: Option<ClaudeDelta>,
}

/// Delta payload in a streaming event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct ClaudeDelta {
    /// Delta type ("text_delta")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Incremental text
    #[serde(default)]
    pub text: Option<String>,
}

/// Normalize a message list into Claude's shape.
///
/// System-role messages are extracted and concatenated (blank-line
/// separated) into the top-level system field. Consecutive same-role
/// messages are merged with a blank-line separator. If the result would
/// open with an assistant turn, a synthetic user placeholder is prepended.
pub fn normalize(messages: &[Message]) -> (Option<String>, Vec<ClaudeMessage>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut normalized: Vec<ClaudeMessage> = Vec::new();

    for message in messages {
        match message.role() {
            Role::System => system_parts.push(message.content()),
            role => {
                let wire_role = role.as_wire();
                match normalized.last_mut() {
                    Some(last) if last.role == wire_role => {
                        last.content.push_str("\n\n");
                        last.content.push_str(message.content());
                    }
                    _ => normalized.push(ClaudeMessage {
                        role: wire_role.to_string(),
                        content: message.content().clone(),
                    }),
                }
            }
        }
    }

    if normalized.first().is_some_and(|m| m.role == "assistant") {
        normalized.insert(
            0,
            ClaudeMessage {
                role: "user".to_string(),
                content: LEADING_USER_PLACEHOLDER.to_string(),
            },
        );
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    (system, normalized)
}

/// Build the outbound request body.
pub(crate) fn build_request(
    config: &ClientConfig,
    messages: &[Message],
    stream: bool,
) -> ClaudeRequest {
    let (system, normalized) = normalize(messages);
    ClaudeRequest {
        model: config.model().clone(),
        max_tokens: config.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
        messages: normalized,
        temperature: *config.temperature(),
        system,
        stream: stream.then_some(true),
    }
}

/// Pull the generated text out of a parsed response.
pub(crate) fn extract_text(response: ClaudeResponse) -> ClientResult<String> {
    let block = response.content.into_iter().next().ok_or_else(|| {
        ClientError::new(ClientErrorKind::MalformedResponse(
            "response has no content blocks".to_string(),
        ))
    })?;

    block.text.ok_or_else(|| {
        ClientError::new(ClientErrorKind::MalformedResponse(
            "content block carries no text".to_string(),
        ))
    })
}

fn messages_url(endpoint: &str) -> String {
    format!("{}/messages", endpoint.trim_end_matches('/'))
}

async fn send(
    http: &reqwest::Client,
    config: &ClientConfig,
    request: &ClaudeRequest,
) -> MaestroResult<reqwest::Response> {
    let endpoint = config.endpoint().as_deref().unwrap_or_default();
    let url = messages_url(endpoint);
    debug!(url = %url, "Sending Claude request");

    let mut req = http
        .post(&url)
        .header("anthropic-version", CLAUDE_VERSION)
        .header("content-type", "application/json")
        .json(request);
    if let Some(credential) = config.credential() {
        req = req.header("x-api-key", credential);
    }

    let response = req.send().await.map_err(|e| {
        error!(error = %e, "Failed to send Claude request");
        ClientError::new(ClientErrorKind::Http(format!("Request failed: {}", e)))
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status, body = %body, "Claude endpoint returned error");
        return Err(ClientError::new(ClientErrorKind::Api { status, body }).into());
    }

    Ok(response)
}

/// One non-streaming request/response round trip.
#[instrument(skip(http, config, messages), fields(model = %config.model()))]
pub(crate) async fn complete(
    http: &reqwest::Client,
    config: &ClientConfig,
    messages: &[Message],
) -> MaestroResult<String> {
    let request = build_request(config, messages, false);
    let response = send(http, config, &request).await?;

    let parsed: ClaudeResponse = response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse Claude response");
        ClientError::new(ClientErrorKind::MalformedResponse(format!(
            "Failed to parse response: {}",
            e
        )))
    })?;

    Ok(extract_text(parsed)?)
}

/// Start a streaming request and decode the event stream.
#[instrument(skip(http, config, messages), fields(model = %config.model()))]
pub(crate) async fn stream_chunks(
    http: &reqwest::Client,
    config: &ClientConfig,
    messages: &[Message],
) -> MaestroResult<ChunkStream> {
    let request = build_request(config, messages, true);
    let response = send(http, config, &request).await?;

    Ok(Box::pin(stream! {
        let mut frames = Box::pin(data_frames(response));
        while let Some(frame) = frames.next().await {
            let payload = match frame {
                Ok(p) => p,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };
            let Some(event) = decode_frame::<ClaudeStreamEvent>(&payload) else {
                continue;
            };
            match event.kind.as_str() {
                "message_stop" => {
                    yield Ok(StreamChunk {
                        delta: String::new(),
                        is_final: true,
                        finish_reason: Some(FinishReason::Stop),
                    });
                    return;
                }
                "content_block_delta" => {
                    if let Some(text) = event.delta.and_then(|d| d.text) {
                        if !text.is_empty() {
                            yield Ok(StreamChunk { delta: text, is_final: false, finish_reason: None });
                        }
                    }
                }
                _ => {}
            }
        }
    }))
}
