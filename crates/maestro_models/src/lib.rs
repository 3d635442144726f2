//! Vendor chat-completion adapters and transports for Maestro.
//!
//! Two incompatible chat-completion protocols (OpenAI-style and
//! Claude-style) are normalized behind one [`VendorClient`] call, over
//! either a trusted-proxy transport or a direct-to-vendor transport, with
//! streaming and non-streaming modes and combined supersede/deadline
//! cancellation.
//!
//! # Example
//!
//! ```no_run
//! use maestro_core::Message;
//! use maestro_models::{ClientConfig, Transport, Vendor, VendorClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(Transport::Direct, Vendor::Claude, "claude-sonnet-4-20250514")
//!     .with_endpoint("https://api.anthropic.com/v1")
//!     .with_credential(std::env::var("MAESTRO_API_KEY")?);
//! let client = VendorClient::new(config)?;
//!
//! let cancel = CancellationToken::new();
//! let text = client
//!     .generate_text(&[Message::user("Where should this scene go next?")], &cancel)
//!     .await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod claude;
mod client;
mod config;
mod openai;
mod proxy;
mod sse;

pub use cancel::bounded;
pub use claude::{
    ClaudeContentBlock, ClaudeDelta, ClaudeMessage, ClaudeRequest, ClaudeResponse,
    ClaudeStreamEvent, normalize,
};
pub use client::{DeltaSink, VendorClient};
pub use config::{ClientConfig, DEFAULT_REQUEST_TIMEOUT, Transport, Vendor};
pub use openai::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage,
    ChunkChoice, Delta, WireMessage,
};
pub use proxy::{ProxyReply, ProxyRequest};
