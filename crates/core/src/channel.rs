//! Channel trait — the abstraction over the conversation transport.
//!
//! A channel carries inbound user events into the orchestrator and broadcasts
//! outbound messages to every connected party. The transport itself (WebSocket,
//! in-process, ...) lives in the channels crate; this is the contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::ChannelError;
use crate::message::Message;

/// Delivery acknowledgment reported to the original sender of an inbound
/// event, exactly once per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AckStatus {
    /// The pipeline produced and broadcast an assistant reply.
    Sent,
    /// The pipeline aborted; no assistant reply was broadcast.
    Error { error: String },
}

/// An inbound event from a connected client.
///
/// The ack sender is a oneshot, so the "at most once" half of the ack
/// contract is enforced by the type system.
#[derive(Debug)]
pub struct InboundEvent {
    /// Raw user text, unconstrained length and content.
    pub text: String,

    /// Where to report delivery status, if the sender asked for one.
    pub ack: Option<oneshot::Sender<AckStatus>>,
}

impl InboundEvent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ack: None,
        }
    }

    pub fn with_ack(text: impl Into<String>, ack: oneshot::Sender<AckStatus>) -> Self {
        Self {
            text: text.into(),
            ack: Some(ack),
        }
    }
}

/// An outbound event fanned out to every connected party.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Broadcast {
    /// A chat message (user echo or assistant reply).
    Message(Message),
    /// An error-class event; emitted only for defect-level pipeline failures.
    Error { message: String },
}

/// The conversation channel contract.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g. "web").
    fn name(&self) -> &str;

    /// Start listening for inbound events.
    ///
    /// Returns a receiver yielding inbound events. The implementation handles
    /// its transport (WebSocket connections, test injection, ...) internally.
    async fn start(&self) -> std::result::Result<mpsc::Receiver<InboundEvent>, ChannelError>;

    /// Broadcast an outbound event to all connected parties.
    async fn broadcast(&self, event: Broadcast) -> std::result::Result<(), ChannelError>;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }
}
