//! LanguageModel trait — the abstraction over the conversational model.
//!
//! The pipeline treats the model as an opaque function from an ordered prompt
//! to text: single request/response, no streaming semantics required.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// The role of one prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry in the ordered prompt sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: ChatRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The core model trait.
///
/// The orchestrator calls `complete()` twice per tool-using message (intent
/// extraction, then synthesis) without knowing which backend is in use.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable provider name (e.g. "openai", "stub").
    fn name(&self) -> &str;

    /// Send the prompt and return the raw text of the model's reply.
    async fn complete(
        &self,
        messages: &[PromptMessage],
    ) -> std::result::Result<String, ProviderError>;
}
