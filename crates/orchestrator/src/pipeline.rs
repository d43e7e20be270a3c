//! The orchestrator — sequences the pipeline per inbound message.
//!
//! Per message: broadcast the user's message, extract intent, validate and
//! invoke if a known tool was requested, synthesize, broadcast the assistant
//! reply, and acknowledge the sender. Each message runs in its own task;
//! nothing is shared across messages except the read-only registry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use opsrelay_core::channel::{AckStatus, Broadcast, Channel, InboundEvent};
use opsrelay_core::error::Error;
use opsrelay_core::event::{EventBus, PipelineEvent};
use opsrelay_core::intent::ReplyContext;
use opsrelay_core::message::Message;
use opsrelay_core::model::LanguageModel;
use opsrelay_core::tool::{SchemaRegistry, ToolBackend, ToolDescriptor, ValidationOutcome};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::extractor::IntentExtractor;
use crate::invoker::ToolInvoker;
use crate::synthesizer::ResponseSynthesizer;
use crate::validator::validate_params;

pub struct Orchestrator {
    extractor: IntentExtractor,
    invoker: ToolInvoker,
    synthesizer: ResponseSynthesizer,
    registry: Arc<SchemaRegistry>,
    channel: Arc<dyn Channel>,
    events: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        backend: Arc<dyn ToolBackend>,
        registry: Arc<SchemaRegistry>,
        channel: Arc<dyn Channel>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            extractor: IntentExtractor::new(model.clone(), registry.clone()),
            invoker: ToolInvoker::new(backend),
            synthesizer: ResponseSynthesizer::new(model),
            registry,
            channel,
            events,
        }
    }

    /// Consume inbound events, spawning one pipeline task per event.
    ///
    /// Messages are processed concurrently with no ordering guarantee
    /// relative to each other.
    pub async fn serve(self: Arc<Self>, mut inbound: mpsc::Receiver<InboundEvent>) {
        info!("Orchestrator serving inbound events");
        while let Some(event) = inbound.recv().await {
            let this = self.clone();
            tokio::spawn(async move {
                this.handle(event).await;
            });
        }
        info!("Inbound channel closed, orchestrator stopping");
    }

    /// Run the pipeline for one inbound event and acknowledge the sender.
    ///
    /// Exactly one of the following happens: an assistant reply is broadcast
    /// and the sender is acked `sent`, or the pipeline aborts, an error event
    /// is broadcast, and the sender is acked `error`.
    pub async fn handle(&self, event: InboundEvent) {
        let InboundEvent { text, ack } = event;

        // A panic is a defect like any other: it must still end in an error
        // ack, not a dropped oneshot.
        let result = match AssertUnwindSafe(self.run(&text)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(Error::Internal(format!(
                "pipeline panicked: {}",
                panic_text(panic.as_ref())
            ))),
        };

        let status = match result {
            Ok(()) => AckStatus::Sent,
            Err(e) => {
                error!(error = %e, "Pipeline aborted");
                self.events.publish(PipelineEvent::PipelineFailed {
                    context: "pipeline".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                // Best effort, shielded the same way: the channel itself may
                // be what failed.
                let _ = AssertUnwindSafe(self.channel.broadcast(Broadcast::Error {
                    message: "Error processing your message".into(),
                }))
                .catch_unwind()
                .await;
                AckStatus::Error {
                    error: e.to_string(),
                }
            }
        };

        if let Some(ack) = ack {
            // Receiver may have disconnected; that's not the pipeline's problem.
            let _ = ack.send(status);
        }
    }

    /// The pipeline proper. Every expected failure mode is recovered into the
    /// reply text; an `Err` here means a defect-level failure (e.g. the
    /// conversation channel itself is broken).
    async fn run(&self, text: &str) -> Result<(), Error> {
        self.events.publish(PipelineEvent::MessageReceived {
            preview: preview(text),
            timestamp: Utc::now(),
        });

        self.channel
            .broadcast(Broadcast::Message(Message::user(text)))
            .await?;

        let intent = self.extractor.extract(text).await;
        self.events.publish(PipelineEvent::IntentExtracted {
            tool: intent.tool_name.clone(),
            timestamp: Utc::now(),
        });

        // An unknown tool name is treated the same as no tool at all.
        let descriptor = intent
            .tool_name
            .as_deref()
            .and_then(|name| self.registry.get(name));
        if intent.tool_name.is_some() && descriptor.is_none() {
            debug!(tool = ?intent.tool_name, "Model proposed an unregistered tool, ignoring");
        }

        let (reply, used_tool) = match descriptor {
            None => {
                let context = ReplyContext::direct(text);
                (self.synthesizer.synthesize(&context).await, false)
            }
            Some(descriptor) => match validate_params(descriptor, &intent.params) {
                ValidationOutcome::Invalid(missing) => {
                    self.events.publish(PipelineEvent::ParamsRejected {
                        tool: descriptor.name.clone(),
                        missing: missing.clone(),
                        timestamp: Utc::now(),
                    });
                    (missing_params_reply(descriptor, &missing), false)
                }
                ValidationOutcome::Valid => {
                    let start = std::time::Instant::now();
                    let result = self.invoker.invoke(&descriptor.name, &intent.params).await;
                    self.events.publish(PipelineEvent::ToolInvoked {
                        tool: descriptor.name.clone(),
                        success: matches!(result, opsrelay_core::tool::ToolResult::Success { .. }),
                        duration_ms: start.elapsed().as_millis() as u64,
                        timestamp: Utc::now(),
                    });

                    let context = ReplyContext::after_tool(text, &descriptor.name, result);
                    (self.synthesizer.synthesize(&context).await, true)
                }
            },
        };

        self.channel
            .broadcast(Broadcast::Message(Message::assistant(reply)))
            .await?;

        self.events.publish(PipelineEvent::ReplyDelivered {
            used_tool,
            timestamp: Utc::now(),
        });

        Ok(())
    }
}

/// The terminal early reply for a tool call with missing parameters.
/// Lists every missing name exactly once, in registry-declared order.
fn missing_params_reply(descriptor: &ToolDescriptor, missing: &[String]) -> String {
    format!(
        "I can run `{}` for you, but I still need: {}. Please provide the missing details and try again.",
        descriptor.name,
        missing.join(", ")
    )
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(MAX).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsrelay_core::tool::ToolDescriptor;

    #[test]
    fn missing_params_reply_lists_names_once_in_order() {
        let descriptor = ToolDescriptor::new("create_environment")
            .required("name", "Environment name")
            .required("resource_type", "Resource type")
            .required("context", "Deployment context");
        let reply =
            missing_params_reply(&descriptor, &["resource_type".into(), "context".into()]);

        assert_eq!(reply.matches("resource_type").count(), 1);
        assert_eq!(reply.matches("context").count(), 1);
        assert!(reply.find("resource_type").unwrap() < reply.find("context").unwrap());
        assert!(!reply.contains("name ("));
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "x".repeat(200);
        let p = preview(&long);
        assert!(p.chars().count() <= 81);
        assert!(p.ends_with('…'));
    }
}
