//! Conversation turns as exposed by the host chat application.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One turn of the host conversation.
///
/// The director never mutates turns; it reads a bounded window of recent
/// ones when rendering chat history, and appends new user turns through the
/// host's injection collaborator.
///
/// # Examples
///
/// ```
/// use maestro_core::Turn;
///
/// let turn = Turn::new("Alice", true, false, "What happens next?");
/// assert_eq!(turn.author(), "Alice");
/// assert!(turn.is_user_authored());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_new::new,
)]
pub struct Turn {
    /// Display name of the speaker
    #[new(into)]
    author: String,
    /// Whether the turn was authored by the human user
    is_user_authored: bool,
    /// Whether the turn is a non-conversational system notice
    is_system_notice: bool,
    /// The turn text
    #[new(into)]
    text: String,
}
