//! Unified vendor client.
//!
//! One entry point over the protocol adapters and transports. The director
//! engine talks to this through the [`GuidanceDriver`] seam and never sees
//! vendor plumbing.

use crate::cancel::bounded;
use crate::sse::ChunkStream;
use crate::{claude, openai, proxy, ClientConfig, Transport, Vendor};
use async_trait::async_trait;
use futures_util::StreamExt;
use maestro_core::{GenerateRequest, GenerateResponse, Message};
use maestro_error::{AbortReason, ClientError, ClientErrorKind, MaestroResult};
use maestro_interface::{GuidanceDriver, ProbeReport, Streaming};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Fixed trivial prompt used by the connection test.
const PROBE_PROMPT: &str = "Reply with the single word: ready";

/// Callback receiving incremental text deltas during streaming.
pub type DeltaSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Vendor chat-completion client.
///
/// Dispatches on the configured transport and vendor, owns the combined
/// supersede/deadline cancellation of every outbound call, and normalizes
/// response shapes down to plain text.
#[derive(Clone)]
pub struct VendorClient {
    config: ClientConfig,
    http: reqwest::Client,
    delta_sink: Option<DeltaSink>,
}

impl std::fmt::Debug for VendorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorClient")
            .field("config", &self.config)
            .field("delta_sink", &self.delta_sink.is_some())
            .finish()
    }
}

impl VendorClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable transport/vendor
    /// combination, before any network call is made.
    pub fn new(config: ClientConfig) -> MaestroResult<Self> {
        config.validate()?;
        debug!(transport = %config.transport(), vendor = %config.vendor(), "Creating vendor client");
        Ok(Self {
            config,
            http: reqwest::Client::new(),
            delta_sink: None,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Attach a callback receiving incremental deltas during streaming.
    pub fn with_delta_sink(mut self, sink: DeltaSink) -> Self {
        self.delta_sink = Some(sink);
        self
    }

    /// Overlay per-request parameters onto the configured defaults.
    fn effective_config(&self, req: &GenerateRequest) -> ClientConfig {
        let mut config = self.config.clone();
        if let Some(model) = req.model() {
            config = config.with_model(model.as_str());
        }
        if let Some(temperature) = req.temperature() {
            config = config.with_temperature(*temperature);
        }
        if let Some(max_tokens) = req.max_tokens() {
            config = config.with_max_tokens(*max_tokens);
        }
        config
    }

    async fn dispatch_complete(
        &self,
        config: &ClientConfig,
        messages: &[Message],
    ) -> MaestroResult<String> {
        match (config.transport(), config.vendor()) {
            (Transport::Proxy, _) => proxy::complete(&self.http, config, messages).await,
            (Transport::Direct, Vendor::OpenAiCompatible) => {
                openai::complete(&self.http, config, messages).await
            }
            (Transport::Direct, Vendor::Claude) => {
                claude::complete(&self.http, config, messages).await
            }
        }
    }

    async fn dispatch_stream(
        &self,
        config: &ClientConfig,
        messages: &[Message],
    ) -> MaestroResult<ChunkStream> {
        match (config.transport(), config.vendor()) {
            (Transport::Proxy, _) => proxy::stream_chunks(&self.http, config, messages).await,
            (Transport::Direct, Vendor::OpenAiCompatible) => {
                openai::stream_chunks(&self.http, config, messages).await
            }
            (Transport::Direct, Vendor::Claude) => {
                claude::stream_chunks(&self.http, config, messages).await
            }
        }
    }

    /// Consume a chunk stream to completion, forwarding deltas to the sink.
    ///
    /// The whole consumption runs under one ceiling deadline shared with the
    /// request setup, so a stalled stream cannot outlive the per-call budget.
    async fn collect_stream(
        &self,
        config: &ClientConfig,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> MaestroResult<String> {
        let deadline = tokio::time::sleep(*config.request_timeout());
        tokio::pin!(deadline);

        let open = self.dispatch_stream(config, messages);
        tokio::pin!(open);
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(
                    ClientError::new(ClientErrorKind::Aborted(AbortReason::Superseded)).into(),
                );
            }
            _ = &mut deadline => {
                return Err(
                    ClientError::new(ClientErrorKind::Aborted(AbortReason::DeadlineElapsed))
                        .into(),
                );
            }
            opened = &mut open => opened?,
        };

        let mut accumulated = String::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(
                        ClientError::new(ClientErrorKind::Aborted(AbortReason::Superseded))
                            .into(),
                    );
                }
                _ = &mut deadline => {
                    return Err(
                        ClientError::new(ClientErrorKind::Aborted(AbortReason::DeadlineElapsed))
                            .into(),
                    );
                }
                item = stream.next() => match item {
                    // Stream close without a sentinel ends normally.
                    None => break,
                    Some(Ok(chunk)) => {
                        if !chunk.delta.is_empty() {
                            if let Some(sink) = &self.delta_sink {
                                sink(&chunk.delta);
                            }
                            accumulated.push_str(&chunk.delta);
                        }
                        if chunk.is_final {
                            break;
                        }
                    }
                    Some(Err(e)) => return Err(e),
                }
            }
        }

        Ok(accumulated)
    }

    /// Generate plain text from a message list.
    ///
    /// Streaming or non-streaming per the configuration; either way the call
    /// is bound to the supplied cancellation token and the configured ceiling
    /// timeout.
    #[instrument(skip(self, messages, cancel), fields(transport = %self.config.transport(), vendor = %self.config.vendor(), message_count = messages.len()))]
    pub async fn generate_text(
        &self,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> MaestroResult<String> {
        if *self.config.stream() {
            self.collect_stream(&self.config, messages, cancel).await
        } else {
            bounded(
                cancel,
                *self.config.request_timeout(),
                self.dispatch_complete(&self.config, messages),
            )
            .await
        }
    }

    /// Connection test: a minimal call down the same path with a fixed
    /// trivial prompt. Never touches round state.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> ProbeReport {
        let messages = vec![Message::user(PROBE_PROMPT)];
        let cancel = CancellationToken::new();

        match bounded(
            &cancel,
            *self.config.request_timeout(),
            self.dispatch_complete(&self.config, &messages),
        )
        .await
        {
            Ok(text) => {
                info!("Connection test succeeded");
                ProbeReport {
                    ok: true,
                    vendor: self.config.vendor().to_string(),
                    model: self.config.model().clone(),
                    detail: text.chars().take(80).collect(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Connection test failed");
                ProbeReport {
                    ok: false,
                    vendor: self.config.vendor().to_string(),
                    model: self.config.model().clone(),
                    detail: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl GuidanceDriver for VendorClient {
    #[instrument(skip(self, req, cancel), fields(vendor = %self.config.vendor(), model = %self.config.model()))]
    async fn generate(
        &self,
        req: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> MaestroResult<GenerateResponse> {
        let config = self.effective_config(req);
        let text = if *config.stream() {
            self.collect_stream(&config, req.messages(), cancel).await?
        } else {
            bounded(
                cancel,
                *config.request_timeout(),
                self.dispatch_complete(&config, req.messages()),
            )
            .await?
        };
        Ok(GenerateResponse::new(text))
    }

    fn vendor_name(&self) -> &'static str {
        match self.config.vendor() {
            Vendor::OpenAiCompatible => "openai-compatible",
            Vendor::Claude => "claude",
        }
    }

    fn model_name(&self) -> &str {
        self.config.model()
    }
}

#[async_trait]
impl Streaming for VendorClient {
    #[instrument(skip(self, req, cancel), fields(vendor = %self.config.vendor(), model = %self.config.model()))]
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> MaestroResult<ChunkStream> {
        let config = self.effective_config(req);
        bounded(
            cancel,
            *config.request_timeout(),
            self.dispatch_stream(&config, req.messages()),
        )
        .await
    }
}
