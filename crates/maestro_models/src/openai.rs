//! Direct OpenAI-compatible protocol adapter.
//!
//! Speaks `POST {endpoint}/chat/completions` with bearer-token auth.
//! Messages pass through unchanged; the protocol has no role-adjacency
//! constraints.

use crate::sse::{ChunkStream, data_frames, decode_frame};
use crate::ClientConfig;
use async_stream::stream;
use futures_util::StreamExt;
use maestro_core::Message;
use maestro_error::{ClientError, ClientErrorKind, ClientResult, MaestroResult};
use maestro_interface::{FinishReason, StreamChunk};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// End-of-stream sentinel payload.
const DONE_SENTINEL: &str = "[DONE]";

/// OpenAI-compatible chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<WireMessage>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Enable streaming mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A role/content pair on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WireMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role().as_wire().to_string(),
            content: message.content().clone(),
        }
    }
}

/// OpenAI-compatible chat completion response.
///
/// Only the fields the director consumes are modeled; unknown fields are
/// ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletionResponse {
    /// Generated completions
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A completion choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Choice {
    /// The generated message (chat-shaped replies)
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    /// Bare generated text (legacy completion-shaped replies)
    #[serde(default)]
    pub text: Option<String>,
    /// Reason why generation finished
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message in a choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct ChoiceMessage {
    /// Role of the message (typically "assistant")
    #[serde(default)]
    pub role: Option<String>,
    /// Generated content
    #[serde(default)]
    pub content: Option<String>,
}

/// Streaming chat completion chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletionChunk {
    /// Delta choices
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A choice in a streaming chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkChoice {
    /// Delta content
    #[serde(default)]
    pub delta: Delta,
    /// Finish reason (if complete)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Delta {
    /// Role (only in first chunk)
    #[serde(default)]
    pub role: Option<String>,
    /// Incremental content
    #[serde(default)]
    pub content: Option<String>,
}

/// Build the outbound request body.
pub(crate) fn build_request(
    config: &ClientConfig,
    messages: &[Message],
    stream: bool,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model().clone(),
        messages: messages.iter().map(WireMessage::from).collect(),
        max_tokens: *config.max_tokens(),
        temperature: *config.temperature(),
        stream: stream.then_some(true),
    }
}

/// Pull the generated text out of a parsed response.
pub(crate) fn extract_text(response: ChatCompletionResponse) -> ClientResult<String> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        ClientError::new(ClientErrorKind::MalformedResponse(
            "response has no choices".to_string(),
        ))
    })?;

    if let Some(message) = choice.message {
        if let Some(content) = message.content {
            return Ok(content);
        }
    }
    if let Some(text) = choice.text {
        return Ok(text);
    }

    Err(ClientError::new(ClientErrorKind::MalformedResponse(
        "choice carries neither message content nor text".to_string(),
    )))
}

fn completions_url(endpoint: &str) -> String {
    format!("{}/chat/completions", endpoint.trim_end_matches('/'))
}

async fn send(
    http: &reqwest::Client,
    config: &ClientConfig,
    request: &ChatCompletionRequest,
) -> MaestroResult<reqwest::Response> {
    let endpoint = config.endpoint().as_deref().unwrap_or_default();
    let url = completions_url(endpoint);
    debug!(url = %url, "Sending chat completion request");

    let mut req = http.post(&url).json(request);
    if let Some(credential) = config.credential() {
        req = req.header("Authorization", format!("Bearer {}", credential));
    }

    let response = req.send().await.map_err(|e| {
        error!(error = %e, "Failed to send chat completion request");
        ClientError::new(ClientErrorKind::Http(format!("Request failed: {}", e)))
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status, body = %body, "Chat completion endpoint returned error");
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

    let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse chat completion response");
        ClientError::new(ClientErrorKind::MalformedResponse(format!(
            "Failed to parse response: {}",
            e
        )))
    })?;

    Ok(extract_text(parsed)?)
}

/// Start a streaming request and decode the chunk stream.
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
            if payload == DONE_SENTINEL {
                yield Ok(StreamChunk {
                    delta: String::new(),
                    is_final: true,
                    finish_reason: Some(FinishReason::Stop),
                });
                return;
            }
            let Some(chunk) = decode_frame::<ChatCompletionChunk>(&payload) else {
                continue;
            };
            let Some(choice) = chunk.choices.into_iter().next() else {
                continue;
            };
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    yield Ok(StreamChunk { delta: content, is_final: false, finish_reason: None });
                }
            }
        }
    }))
}
