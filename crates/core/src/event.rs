//! Pipeline event system — an injectable observer for the orchestrator.
//!
//! The orchestrator publishes an event at each stage boundary instead of
//! writing to a process-wide sink, so tests can assert on the pipeline's
//! behavior without capturing log output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything observable about one trip through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// An inbound user message entered the pipeline
    MessageReceived {
        preview: String,
        timestamp: DateTime<Utc>,
    },

    /// Intent extraction finished
    IntentExtracted {
        tool: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Validation rejected a tool call; the tool was not invoked
    ParamsRejected {
        tool: String,
        missing: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A tool was invoked against the backend
    ToolInvoked {
        tool: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The assistant reply was broadcast
    ReplyDelivered {
        used_tool: bool,
        timestamp: DateTime<Utc>,
    },

    /// A defect-level failure aborted the pipeline for this message
    PipelineFailed {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based bus for pipeline events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Subscribers
/// filter for the events they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<PipelineEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: PipelineEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PipelineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
