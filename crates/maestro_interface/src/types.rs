//! Core type definitions for the Maestro interface.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// A single chunk from a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct StreamChunk {
    /// Incremental text delta.
    #[builder(setter(into))]
    pub delta: String,
    /// Whether this is the final chunk.
    #[builder(default)]
    pub is_final: bool,
    /// Optional finish reason if final.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// Start building a chunk.
    pub fn builder() -> StreamChunkBuilder {
        StreamChunkBuilder::default()
    }
}

/// Why generation stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
)]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Hit a stop sequence.
    StopSequence,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}

/// Outcome summary of a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Whether the trivial round trip succeeded
    pub ok: bool,
    /// Vendor the probe was routed to
    pub vendor: String,
    /// Model the probe was routed to
    pub model: String,
    /// Short human-readable detail (first response words, or the failure)
    pub detail: String,
}
