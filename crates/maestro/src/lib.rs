//! Maestro - Director Orchestration for Interactive Chat
//!
//! Maestro automates a recurring "director" action in an interactive chat
//! loop: after each assistant turn, it independently queries an LLM endpoint
//! for narrative guidance, then injects that guidance as a new user turn to
//! steer subsequent generation, repeating for a configured number of rounds.
//!
//! # Features
//!
//! - **Round Engine**: a state machine sequencing waiting, generation,
//!   optional human review, and turn injection
//! - **Prompt Presets**: ordered, reorderable content blocks rendered into
//!   one normalized request payload
//! - **Filter Chains**: ordered pattern/replacement post-processing
//! - **Multi-Vendor Client**: OpenAI-style and Claude-style protocols behind
//!   one call, over proxy or direct transports, streaming or not
//! - **Cancellation**: supersede/deadline composition on every outbound call
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use maestro::{
//!     ClientConfig, DirectorEngine, DirectorSettings, Preset, PresetLibrary, Transport,
//!     Vendor, VendorClient,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VendorClient::new(
//!         ClientConfig::new(Transport::Direct, Vendor::Claude, "claude-sonnet-4-20250514")
//!             .with_endpoint("https://api.anthropic.com/v1")
//!             .with_credential(std::env::var("MAESTRO_API_KEY")?),
//!     )?;
//!
//!     let mut presets = PresetLibrary::new();
//!     presets.insert(Preset::standard(
//!         "noir",
//!         "You are the director of a noir radio drama.",
//!         "Give one paragraph of narrative direction.",
//!     ));
//!     presets.select("noir")?;
//!
//!     let settings = DirectorSettings::new(client.config().clone())
//!         .with_enabled(true)
//!         .with_total_rounds(4);
//!
//!     // conversation and injector are host-side collaborators.
//!     let mut engine = DirectorEngine::new(
//!         settings,
//!         presets,
//!         Arc::new(client),
//!         conversation,
//!         injector,
//!     );
//!     engine.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Maestro is organized as a workspace with focused crates:
//!
//! - `maestro_core` - Core data types (Message, Role, Turn, requests)
//! - `maestro_interface` - GuidanceDriver trait definitions
//! - `maestro_error` - Error types
//! - `maestro_models` - Vendor protocol adapters and transports
//! - `maestro_director` - Presets, filters, and the round engine
//!
//! This crate (`maestro`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use maestro_core::{
    GenerateRequest, GenerateRequestBuilder, GenerateResponse, Message, Role, Turn,
    init_telemetry, shutdown_telemetry,
};
pub use maestro_director::{
    AssemblyContext, BlockKind, ChatHistoryMode, ContentBlock, ConversationStore, DirectorEngine,
    DirectorSettings, FilterRule, GuidanceReviewer, InMemoryConversation, OutlinePolicy, Preset,
    PresetLibrary, ReadinessConfig, ReadinessProbe, RoundOutcome, RoundState, SettingsManager,
    SettingsStore, StopHandle, StopReport, TextFilterChain, TurnInjector, assemble,
};
pub use maestro_error::{
    AbortReason, ClientError, ClientErrorKind, ConfigError, DirectorError, DirectorErrorKind,
    ErrorCategory, MaestroError, MaestroErrorKind, MaestroResult,
};
pub use maestro_interface::{FinishReason, GuidanceDriver, ProbeReport, StreamChunk, Streaming};
pub use maestro_models::{
    ClientConfig, DeltaSink, ProxyReply, ProxyRequest, Transport, Vendor, VendorClient, bounded,
    normalize,
};
