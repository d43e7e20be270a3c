//! Web channel — the bridge between WebSocket sessions and the pipeline.
//!
//! The gateway's WebSocket handlers drive this: each connection registers a
//! session, pushes inbound frames through `inject`, and drains its session
//! receiver for outbound events. A broadcast fans out to every registered
//! session, so all connected clients see the shared conversation.

use std::collections::HashMap;

use async_trait::async_trait;
use opsrelay_core::channel::{Broadcast, Channel, InboundEvent};
use opsrelay_core::error::ChannelError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

pub struct WebChannel {
    /// Inbound event sender, set by `start` and used by WebSocket handlers.
    inject_tx: Mutex<Option<mpsc::Sender<InboundEvent>>>,
    /// Outbound senders per session, each holding serialized broadcast frames.
    sessions: Mutex<HashMap<String, mpsc::Sender<String>>>,
}

impl WebChannel {
    pub fn new() -> Self {
        Self {
            inject_tx: Mutex::new(None),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Push an inbound event from a connected client into the pipeline.
    pub async fn inject(&self, event: InboundEvent) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx
                .send(event)
                .await
                .map_err(|_| ChannelError::ConnectionLost("inbound channel closed".into())),
            None => Err(ChannelError::NotStarted("web".into())),
        }
    }

    /// Register a session and get its outbound frame receiver.
    pub async fn register_session(&self, session_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(64);
        self.sessions.lock().await.insert(session_id.to_string(), tx);
        debug!(session_id = %session_id, "Session registered");
        rx
    }

    /// Drop a session; its receiver stops getting frames.
    pub async fn unregister_session(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
        debug!(session_id = %session_id, "Session unregistered");
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for WebChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for WebChannel {
    fn name(&self) -> &str {
        "web"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundEvent>, ChannelError> {
        info!("Web channel starting");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    /// Fan an event out to every registered session.
    ///
    /// Sessions whose receiver has gone away are pruned here rather than
    /// failing the broadcast; a client that disconnected mid-pipeline is not
    /// a delivery failure for everyone else.
    async fn broadcast(&self, event: Broadcast) -> Result<(), ChannelError> {
        let frame = serde_json::to_string(&event).map_err(|e| ChannelError::DeliveryFailed {
            channel: "web".into(),
            reason: e.to_string(),
        })?;

        let mut sessions = self.sessions.lock().await;
        let mut dead = Vec::new();
        for (session_id, tx) in sessions.iter() {
            if tx.send(frame.clone()).await.is_err() {
                dead.push(session_id.clone());
            }
        }
        for session_id in dead {
            debug!(session_id = %session_id, "Pruning disconnected session");
            sessions.remove(&session_id);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Web channel stopping");
        *self.inject_tx.lock().await = None;
        self.sessions.lock().await.clear();
        Ok(())
    }
}
