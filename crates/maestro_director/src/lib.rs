//! Round-based director orchestration for interactive chat.
//!
//! After each assistant turn in the host conversation, the director queries
//! an LLM endpoint for narrative guidance and injects the result as a new
//! user turn, repeating for a configured number of rounds.
//!
//! The pieces:
//!
//! - [`Preset`] / [`ContentBlock`] — the configurable layout of the outbound
//!   prompt, loaded from TOML and reordered with plain list operations.
//! - [`assemble`] — renders the enabled blocks plus live state into one
//!   normalized request payload.
//! - [`TextFilterChain`] — ordered pattern/replacement post-processing.
//! - [`DirectorEngine`] — the round state machine sequencing waiting,
//!   generation, optional human review, and turn injection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod collaborators;
mod engine;
mod filter;
mod preset;
mod settings;
mod state;

pub use assembler::{AssemblyContext, assemble};
pub use collaborators::{
    ConversationStore, GuidanceReviewer, InMemoryConversation, ReadinessProbe, TurnInjector,
};
pub use engine::{DirectorEngine, RoundOutcome, StopHandle, StopReport};
pub use filter::{FilterRule, TextFilterChain};
pub use preset::{BlockKind, ChatHistoryMode, ContentBlock, Preset, PresetLibrary};
pub use settings::{
    DirectorSettings, OutlinePolicy, ReadinessConfig, SettingsManager, SettingsStore,
};
pub use state::RoundState;
