//! Message domain types.
//!
//! A `Message` is the value object that flows through the whole system:
//! a user sends one over the channel, the orchestrator processes it, and
//! exactly one assistant `Message` comes back out. Messages are immutable
//! once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System notices (connection status, errors)
    System,
}

/// A single chat message broadcast on the conversation channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub sender: Sender,

    /// The text content
    pub text: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create a new assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    /// Create a new system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
