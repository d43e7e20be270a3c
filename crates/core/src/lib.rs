//! # opsrelay Core
//!
//! Domain types, traits, and error definitions for the opsrelay chat
//! orchestrator. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, tool backend, conversation
//! channel) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Deterministic pipeline tests with stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod event;
pub mod intent;
pub mod message;
pub mod model;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use channel::{AckStatus, Broadcast, Channel, InboundEvent};
pub use error::{BackendError, ChannelError, Error, ProviderError, Result};
pub use event::{EventBus, PipelineEvent};
pub use intent::{ReplyContext, ToolIntent};
pub use message::{Message, Sender};
pub use model::{ChatRole, LanguageModel, PromptMessage};
pub use tool::{SchemaRegistry, ToolBackend, ToolDescriptor, ToolResult, ValidationOutcome};
