//! Trait definitions for LLM backends and their capabilities.

use crate::StreamChunk;
use async_trait::async_trait;
use futures_util::stream::Stream;
use maestro_core::{GenerateRequest, GenerateResponse};
use maestro_error::MaestroResult;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Core trait that all guidance backends must implement.
///
/// This provides the minimal interface for one-shot text generation. Every
/// call is bound to a caller-supplied cancellation token; the backend must
/// resolve to an aborted outcome when the token fires, never hang.
#[async_trait]
pub trait GuidanceDriver: Send + Sync {
    /// Generate model output given a normalized request.
    async fn generate(
        &self,
        req: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> MaestroResult<GenerateResponse>;

    /// Vendor name (e.g., "openai-compatible", "claude").
    fn vendor_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;
}

/// Trait for backends that support streaming responses.
#[async_trait]
pub trait Streaming: GuidanceDriver {
    /// Generate a streaming response.
    ///
    /// Returns a stream that yields incremental deltas as they arrive from
    /// the API. The stream ends at the vendor's end-of-stream sentinel or at
    /// stream close, whichever comes first.
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> MaestroResult<Pin<Box<dyn Stream<Item = MaestroResult<StreamChunk>> + Send>>>;
}
