//! WebSocket chat gateway.
//!
//! Exposes two routes: `GET /health` and `GET /ws`. Each WebSocket connection
//! becomes a session on the shared web channel; inbound text frames are fed
//! into the pipeline with a per-message ack, and every session receives the
//! shared conversation's broadcast frames.
//!
//! Built on Axum.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{self, WebSocket},
    },
    response::{IntoResponse, Json},
    routing::get,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use opsrelay_channels::WebChannel;
use opsrelay_core::channel::{AckStatus, Channel, InboundEvent};
use opsrelay_core::event::{EventBus, PipelineEvent};
use opsrelay_core::tool::ToolBackend;
use opsrelay_orchestrator::Orchestrator;
use opsrelay_tools::HttpToolBackend;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared state behind the gateway routes.
pub struct GatewayState {
    pub channel: Arc<WebChannel>,
    pub started_at: DateTime<Utc>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with the gateway routes.
///
/// CORS allows any origin: the chat page is served separately and connects
/// cross-origin, and the gateway carries no cookies or credentials.
pub fn build_router(state: SharedState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway: wire the pipeline, start the channel, serve HTTP.
pub async fn start(config: opsrelay_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let model = opsrelay_providers::build_from_config(&config);
    let backend: Arc<dyn ToolBackend> = Arc::new(HttpToolBackend::from_config(&config.backend));
    let registry = Arc::new(opsrelay_tools::registry_from_config(&config));
    let channel = Arc::new(WebChannel::new());
    let events = Arc::new(EventBus::default());

    spawn_event_logger(events.clone());

    let inbound = channel.start().await?;
    let orchestrator = Arc::new(Orchestrator::new(
        model,
        backend,
        registry,
        channel.clone(),
        events,
    ));
    tokio::spawn(orchestrator.serve(inbound));

    let state = Arc::new(GatewayState {
        channel,
        started_at: Utc::now(),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Mirror pipeline events into the tracing log.
fn spawn_event_logger(events: Arc<EventBus>) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event.as_ref() {
                PipelineEvent::MessageReceived { preview, .. } => {
                    info!(preview = %preview, "Message received");
                }
                PipelineEvent::IntentExtracted { tool, .. } => {
                    debug!(tool = ?tool, "Intent extracted");
                }
                PipelineEvent::ParamsRejected { tool, missing, .. } => {
                    info!(tool = %tool, missing = ?missing, "Tool call rejected, params missing");
                }
                PipelineEvent::ToolInvoked {
                    tool,
                    success,
                    duration_ms,
                    ..
                } => {
                    info!(tool = %tool, success, duration_ms, "Tool invoked");
                }
                PipelineEvent::ReplyDelivered { used_tool, .. } => {
                    info!(used_tool, "Reply delivered");
                }
                PipelineEvent::PipelineFailed {
                    context,
                    error_message,
                    ..
                } => {
                    warn!(context = %context, error = %error_message, "Pipeline failed");
                }
            }
        }
    });
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    channel: &'static str,
    active_sessions: usize,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        channel: "web",
        active_sessions: state.channel.active_sessions().await,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

async fn ws_handler(State(state): State<SharedState>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Drive one WebSocket connection for its lifetime.
///
/// The writer half multiplexes two sources: the session's broadcast frames
/// and this connection's own ack frames. The reader half turns each text
/// frame into an inbound pipeline event carrying a oneshot ack.
async fn handle_socket(state: SharedState, socket: WebSocket) {
    let session_id = Uuid::new_v4().to_string();
    info!(session_id = %session_id, "WebSocket session opened");

    let mut outbound = state.channel.register_session(&session_id).await;
    let (ack_tx, mut ack_rx) = mpsc::channel::<String>(16);
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                frame = outbound.recv() => frame,
                frame = ack_rx.recv() => frame,
            };
            let Some(frame) = frame else { break };
            if sink.send(ws::Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            ws::Message::Text(text) => {
                let (tx, rx) = oneshot::channel();
                let event = InboundEvent::with_ack(text.to_string(), tx);
                if let Err(e) = state.channel.inject(event).await {
                    warn!(session_id = %session_id, error = %e, "Inbound injection failed");
                    break;
                }
                let ack_tx = ack_tx.clone();
                tokio::spawn(async move {
                    if let Ok(status) = rx.await {
                        let _ = ack_tx.send(ack_frame(&status)).await;
                    }
                });
            }
            ws::Message::Close(_) => break,
            // Ping/pong handled by axum; binary frames are not part of the protocol.
            _ => {}
        }
    }

    state.channel.unregister_session(&session_id).await;
    writer.abort();
    info!(session_id = %session_id, "WebSocket session closed");
}

/// Serialize an ack as a tagged frame, e.g. `{"type":"ack","status":"sent"}`.
fn ack_frame(status: &AckStatus) -> String {
    let mut value = serde_json::to_value(status).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("type".into(), "ack".into());
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_frame_tags_sent() {
        let frame = ack_frame(&AckStatus::Sent);
        let v: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(v["type"], "ack");
        assert_eq!(v["status"], "sent");
    }

    #[test]
    fn ack_frame_carries_error() {
        let frame = ack_frame(&AckStatus::Error {
            error: "boom".into(),
        });
        let v: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"], "boom");
    }

    #[tokio::test]
    async fn cross_origin_requests_are_allowed() {
        use tower::ServiceExt;

        let channel = Arc::new(WebChannel::new());
        let _rx = channel.start().await.unwrap();
        let state = Arc::new(GatewayState {
            channel,
            started_at: Utc::now(),
        });

        let response = build_router(state)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .header(axum::http::header::ORIGIN, "http://localhost:8080")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn health_reports_sessions() {
        let channel = Arc::new(WebChannel::new());
        let _rx = channel.start().await.unwrap();
        let _session = channel.register_session("s1").await;

        let state = Arc::new(GatewayState {
            channel,
            started_at: Utc::now(),
        });
        let Json(health) = health_handler(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.active_sessions, 1);
    }
}
