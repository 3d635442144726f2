//! Collaborator seams owned by the host chat application.
//!
//! These traits are defined here, next to the engine that consumes them, to
//! keep the dependency graph flat; implementations live in the host.

use async_trait::async_trait;
use maestro_core::Turn;
use maestro_error::MaestroResult;
use std::time::Duration;

/// Read access to the host conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The most recent `limit` turns, oldest first.
    async fn recent_turns(&self, limit: usize) -> MaestroResult<Vec<Turn>>;

    /// Append a turn to the conversation.
    async fn append(&self, turn: Turn) -> MaestroResult<()>;
}

/// The host's turn-injection trigger.
#[async_trait]
pub trait TurnInjector: Send + Sync {
    /// Append `text` as a new user turn and trigger the next upstream
    /// generation. Fire-and-forget from the engine's perspective: resolving
    /// this call means the injection was issued, not that the upstream
    /// reply arrived.
    async fn inject_user_turn_and_generate(&self, text: &str) -> MaestroResult<()>;
}

/// An observable started/finished indicator owned by a collaborator outside
/// the engine (e.g. the host's own generation status).
///
/// Absence of the indicator, or an elapsed timeout, is non-fatal: the engine
/// simply proceeds.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Wait up to `timeout` for the indicator to start. Returns whether it did.
    async fn wait_started(&self, timeout: Duration) -> bool;

    /// Wait up to `timeout` for the indicator to finish. Returns whether it did.
    async fn wait_finished(&self, timeout: Duration) -> bool;
}

/// Human confirmation step for drafted guidance.
#[async_trait]
pub trait GuidanceReviewer: Send + Sync {
    /// Present the draft. `Some(text)` sends (possibly edited) text; `None`
    /// skips the round without sending.
    async fn confirm(&self, draft: &str) -> MaestroResult<Option<String>>;
}

/// In-memory conversation store, useful for tests and embedding hosts that
/// keep their transcript elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryConversation {
    turns: std::sync::Mutex<Vec<Turn>>,
}

impl InMemoryConversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with turns.
    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns: std::sync::Mutex::new(turns),
        }
    }

    /// Total turns held.
    pub fn len(&self) -> usize {
        self.turns.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// True when no turns are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversation {
    async fn recent_turns(&self, limit: usize) -> MaestroResult<Vec<Turn>> {
        let turns = self.turns.lock().unwrap_or_else(|p| p.into_inner());
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    async fn append(&self, turn: Turn) -> MaestroResult<()> {
        self.turns
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(turn);
        Ok(())
    }
}
