//! Proxy transport.
//!
//! Routes generation through a trusted intermediary supplied by the host
//! application, which fans out to the real vendor. The proxy is loose about
//! reply shape, so decoding attempts each known shape in a fixed priority
//! order: bare string, then OpenAI-style choices, then Claude-style content.

use crate::sse::{ChunkStream, data_frames, decode_frame};
use crate::{claude, openai, ClientConfig, Vendor};
use async_stream::stream;
use futures_util::StreamExt;
use maestro_core::Message;
use maestro_error::{ClientError, ClientErrorKind, ClientResult, MaestroResult};
use maestro_interface::{FinishReason, StreamChunk};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error, instrument};

/// Request envelope the proxy accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    /// Vendor the proxy should fan out to
    pub vendor: String,
    /// Conversation messages
    pub messages: Vec<openai::WireMessage>,
    /// Model identifier
    pub model: String,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Enable streaming mode
    pub stream: bool,
    /// Vendor endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_override: Option<String>,
    /// Vendor credential override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_override: Option<String>,
}

/// The reply shapes a proxy is known to produce.
///
/// One decode attempt per shape, in fixed priority order; anything else is
/// a malformed response.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyReply {
    /// Bare string body
    Bare(String),
    /// OpenAI-style `choices[0].message.content` / `choices[0].text`
    OpenAi(String),
    /// Claude-style `content[0].text`
    Claude(String),
}

impl ProxyReply {
    /// Decode a reply body, trying each shape in priority order.
    pub fn decode(value: JsonValue) -> ClientResult<Self> {
        if let JsonValue::String(text) = value {
            return Ok(Self::Bare(text));
        }

        if let Ok(response) =
            serde_json::from_value::<openai::ChatCompletionResponse>(value.clone())
        {
            if !response.choices.is_empty() {
                if let Ok(text) = openai::extract_text(response) {
                    return Ok(Self::OpenAi(text));
                }
            }
        }

        if let Ok(response) = serde_json::from_value::<claude::ClaudeResponse>(value) {
            if !response.content.is_empty() {
                if let Ok(text) = claude::extract_text(response) {
                    return Ok(Self::Claude(text));
                }
            }
        }

        Err(ClientError::new(ClientErrorKind::MalformedResponse(
            "proxy reply matches no known shape".to_string(),
        )))
    }

    /// The reply text, regardless of shape.
    pub fn into_text(self) -> String {
        match self {
            Self::Bare(text) | Self::OpenAi(text) | Self::Claude(text) => text,
        }
    }
}

/// Build the outbound request envelope.
pub(crate) fn build_request(
    config: &ClientConfig,
    messages: &[Message],
    stream: bool,
) -> ProxyRequest {
    ProxyRequest {
        vendor: config.vendor().as_wire().to_string(),
        messages: messages.iter().map(openai::WireMessage::from).collect(),
        model: config.model().clone(),
        temperature: *config.temperature(),
        max_tokens: *config.max_tokens(),
        stream,
        endpoint_override: config.endpoint().clone(),
        credential_override: config.credential().clone(),
    }
}

async fn send(
    http: &reqwest::Client,
    config: &ClientConfig,
    request: &ProxyRequest,
) -> MaestroResult<reqwest::Response> {
    let url = config.proxy_url().as_deref().unwrap_or_default().to_string();
    debug!(url = %url, vendor = %request.vendor, "Sending proxied generation request");

    let response = http.post(&url).json(request).send().await.map_err(|e| {
        error!(error = %e, "Failed to reach proxy");
        ClientError::new(ClientErrorKind::Http(format!("Request failed: {}", e)))
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status, body = %body, "Proxy returned error");
        return Err(ClientError::new(ClientErrorKind::Api { status, body }).into());
    }

    Ok(response)
}

/// One non-streaming request/response round trip through the proxy.
#[instrument(skip(http, config, messages), fields(vendor = %config.vendor(), model = %config.model()))]
pub(crate) async fn complete(
    http: &reqwest::Client,
    config: &ClientConfig,
    messages: &[Message],
) -> MaestroResult<String> {
    let request = build_request(config, messages, false);
    let response = send(http, config, &request).await?;

    let value: JsonValue = response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse proxy reply");
        ClientError::new(ClientErrorKind::MalformedResponse(format!(
            "Failed to parse response: {}",
            e
        )))
    })?;

    Ok(ProxyReply::decode(value)?.into_text())
}

/// Start a streaming request through the proxy.
///
/// Streamed frames keep the underlying vendor's chunk schema, so delta
/// extraction follows the configured vendor.
#[instrument(skip(http, config, messages), fields(vendor = %config.vendor(), model = %config.model()))]
pub(crate) async fn stream_chunks(
    http: &reqwest::Client,
    config: &ClientConfig,
    messages: &[Message],
) -> MaestroResult<ChunkStream> {
    let request = build_request(config, messages, true);
    let vendor = *config.vendor();
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
            match vendor {
                Vendor::OpenAiCompatible => {
                    if payload == "[DONE]" {
                        yield Ok(StreamChunk {
                            delta: String::new(),
                            is_final: true,
                            finish_reason: Some(FinishReason::Stop),
                        });
                        return;
                    }
                    let Some(chunk) = decode_frame::<openai::ChatCompletionChunk>(&payload) else {
                        continue;
                    };
                    if let Some(content) = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                    {
                        if !content.is_empty() {
                            yield Ok(StreamChunk { delta: content, is_final: false, finish_reason: None });
                        }
                    }
                }
                Vendor::Claude => {
                    let Some(event) = decode_frame::<claude::ClaudeStreamEvent>(&payload) else {
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
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_string_decodes_first() {
        let reply = ProxyReply::decode(json!("just text")).expect("decoded");
        assert_eq!(reply, ProxyReply::Bare("just text".to_string()));
    }

    #[test]
    fn openai_shape_decodes_before_claude() {
        let reply = ProxyReply::decode(json!({
            "choices": [{"message": {"role": "assistant", "content": "via choices"}}],
            "content": [{"type": "text", "text": "via content"}],
        }))
        .expect("decoded");
        assert_eq!(reply, ProxyReply::OpenAi("via choices".to_string()));
    }

    #[test]
    fn openai_text_variant_decodes() {
        let reply = ProxyReply::decode(json!({
            "choices": [{"text": "completion style"}],
        }))
        .expect("decoded");
        assert_eq!(reply, ProxyReply::OpenAi("completion style".to_string()));
    }

    #[test]
    fn claude_shape_decodes_last() {
        let reply = ProxyReply::decode(json!({
            "content": [{"type": "text", "text": "claude style"}],
        }))
        .expect("decoded");
        assert_eq!(reply, ProxyReply::Claude("claude style".to_string()));
    }

    #[test]
    fn unknown_shape_is_malformed() {
        let err = ProxyReply::decode(json!({"status": "ok"})).unwrap_err();
        assert!(matches!(err.kind, ClientErrorKind::MalformedResponse(_)));
    }

    #[test]
    fn envelope_uses_camel_case_overrides() {
        let config = ClientConfig::new(crate::Transport::Proxy, Vendor::Claude, "claude-sonnet-4-20250514")
            .with_proxy_url("http://localhost:8000/proxy")
            .with_endpoint("https://api.anthropic.com/v1")
            .with_credential("sk-test")
            .with_max_tokens(512);
        let request = build_request(&config, &[Message::user("hi")], true);
        let json = serde_json::to_value(&request).expect("serializable");
        assert_eq!(json["vendor"], "claude");
        assert_eq!(json["maxTokens"], 512);
        assert_eq!(json["endpointOverride"], "https://api.anthropic.com/v1");
        assert_eq!(json["credentialOverride"], "sk-test");
        assert_eq!(json["stream"], true);
    }
}
