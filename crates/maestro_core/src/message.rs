//! Message types for outbound request payloads.

use crate::Role;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A single message in a request payload.
///
/// Ordering within a list is significant (conversation order).
///
/// # Examples
///
/// ```
/// use maestro_core::{Message, Role};
///
/// let message = Message::user("Hello!");
///
/// assert_eq!(*message.role(), Role::User);
/// assert_eq!(message.content(), "Hello!");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_new::new,
)]
pub struct Message {
    /// The role of the message sender
    role: Role,
    /// The text content of the message
    #[new(into)]
    content: String,
}

impl Message {
    /// Construct a system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Construct a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Construct an assistant-role message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Replace the content, keeping the role.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self::new(self.role, content)
    }
}
