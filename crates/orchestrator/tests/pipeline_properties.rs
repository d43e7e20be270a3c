//! End-to-end pipeline tests with scripted model, backend, and channel stubs.
//!
//! The model stub replays a queue of canned completions (one per round-trip),
//! the backend stub records invocations, and the channel stub records every
//! broadcast, so each test can assert on the full outward-facing behavior of
//! one message's pipeline.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use opsrelay_core::channel::{AckStatus, Broadcast, Channel, InboundEvent};
use opsrelay_core::error::{BackendError, ChannelError, ProviderError};
use opsrelay_core::event::EventBus;
use opsrelay_core::message::Sender;
use opsrelay_core::model::{LanguageModel, PromptMessage};
use opsrelay_core::tool::{SchemaRegistry, ToolBackend, ToolDescriptor};
use opsrelay_orchestrator::Orchestrator;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

// --- Stubs ---

struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> Vec<PromptMessage> {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::NotConfigured("script exhausted".into())))
    }
}

struct ScriptedBackend {
    response: Result<Value, BackendError>,
    invocations: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl ScriptedBackend {
    fn new(response: Result<Value, BackendError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            invocations: Mutex::new(Vec::new()),
        })
    }

    fn invocations(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolBackend for ScriptedBackend {
    async fn execute(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, BackendError> {
        self.invocations
            .lock()
            .unwrap()
            .push((name.to_string(), params.clone()));
        self.response.clone()
    }
}

struct RecordingChannel {
    broadcasts: Mutex<Vec<Broadcast>>,
    fail: bool,
}

impl RecordingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            broadcasts: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            broadcasts: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn messages(&self) -> Vec<(Sender, String)> {
        self.broadcasts
            .lock()
            .unwrap()
            .iter()
            .filter_map(|b| match b {
                Broadcast::Message(m) => Some((m.sender, m.text.clone())),
                Broadcast::Error { .. } => None,
            })
            .collect()
    }

    fn error_events(&self) -> usize {
        self.broadcasts
            .lock()
            .unwrap()
            .iter()
            .filter(|b| matches!(b, Broadcast::Error { .. }))
            .count()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundEvent>, ChannelError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn broadcast(&self, event: Broadcast) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::ConnectionLost("socket closed".into()));
        }
        self.broadcasts.lock().unwrap().push(event);
        Ok(())
    }
}

// --- Fixtures ---

fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register(ToolDescriptor::new("get_environments"));
    registry.register(
        ToolDescriptor::new("create_environment")
            .required("name", "Environment name")
            .required("resource_type", "Resource type, e.g. CCE")
            .required("context", "Region and cluster context"),
    );
    Arc::new(registry)
}

struct Harness {
    model: Arc<ScriptedModel>,
    backend: Arc<ScriptedBackend>,
    channel: Arc<RecordingChannel>,
    orchestrator: Orchestrator,
}

fn harness(
    model_responses: Vec<Result<String, ProviderError>>,
    backend_response: Result<Value, BackendError>,
) -> Harness {
    let model = ScriptedModel::new(model_responses);
    let backend = ScriptedBackend::new(backend_response);
    let channel = RecordingChannel::new();
    let orchestrator = Orchestrator::new(
        model.clone(),
        backend.clone(),
        registry(),
        channel.clone(),
        Arc::new(EventBus::default()),
    );
    Harness {
        model,
        backend,
        channel,
        orchestrator,
    }
}

async fn send(orchestrator: &Orchestrator, text: &str) -> AckStatus {
    let (tx, rx) = oneshot::channel();
    orchestrator
        .handle(InboundEvent::with_ack(text, tx))
        .await;
    rx.await.expect("ack must be delivered exactly once")
}

// --- Scenario A: tool with no required params runs end to end ---

#[tokio::test]
async fn tool_success_flows_into_post_processing_synthesis() {
    let h = harness(
        vec![
            Ok(r#"{"tool": "get_environments", "params": {}}"#.into()),
            Ok("You have two environments: dev and stage.".into()),
        ],
        Ok(serde_json::json!([{"name": "dev"}, {"name": "stage"}])),
    );

    let ack = send(&h.orchestrator, "list my environments").await;
    assert_eq!(ack, AckStatus::Sent);

    assert_eq!(h.backend.invocations(), 1);
    assert_eq!(h.model.calls(), 2);

    // The synthesis prompt must carry both environment names from the result.
    let synthesis_prompt = h.model.prompt(1);
    assert!(synthesis_prompt[0].content.contains("dev"));
    assert!(synthesis_prompt[0].content.contains("stage"));
    assert!(synthesis_prompt[0].content.contains("get_environments"));

    let messages = h.channel.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], (Sender::User, "list my environments".into()));
    assert_eq!(messages[1].0, Sender::Assistant);
    assert_eq!(messages[1].1, "You have two environments: dev and stage.");
}

// --- Scenario B: missing params block invocation ---

#[tokio::test]
async fn missing_params_skip_invoker_and_enumerate_names() {
    let h = harness(
        vec![Ok(
            r#"{"tool": "create_environment", "params": {"name": "x"}}"#.into(),
        )],
        Ok(Value::Null),
    );

    let ack = send(&h.orchestrator, "create an environment").await;
    assert_eq!(ack, AckStatus::Sent);

    // The invoker must never run, and no second model call happens.
    assert_eq!(h.backend.invocations(), 0);
    assert_eq!(h.model.calls(), 1);

    let messages = h.channel.messages();
    let reply = &messages[1].1;
    assert_eq!(reply.matches("resource_type").count(), 1);
    assert_eq!(reply.matches("context").count(), 1);
    assert!(reply.find("resource_type").unwrap() < reply.find("context").unwrap());
}

// --- Scenario C: no tool requested ---

#[tokio::test]
async fn null_tool_takes_direct_path_only() {
    let h = harness(
        vec![
            Ok(r#"{"tool": null, "params": {}}"#.into()),
            Ok("Hello! How can I help with your environments?".into()),
        ],
        Ok(Value::Null),
    );

    let ack = send(&h.orchestrator, "hello").await;
    assert_eq!(ack, AckStatus::Sent);
    assert_eq!(h.backend.invocations(), 0);
    assert_eq!(h.model.calls(), 2);

    let messages = h.channel.messages();
    assert_eq!(messages[1].1, "Hello! How can I help with your environments?");
}

// --- Malformed intent JSON behaves exactly like "no tool" ---

#[tokio::test]
async fn malformed_intent_json_means_direct_reply() {
    let h = harness(
        vec![
            Ok("I think you want to list environments!".into()),
            Ok("direct reply".into()),
        ],
        Ok(Value::Null),
    );

    let ack = send(&h.orchestrator, "list envs").await;
    assert_eq!(ack, AckStatus::Sent);
    assert_eq!(h.backend.invocations(), 0);
    assert_eq!(h.channel.messages()[1].1, "direct reply");
}

// --- Unknown tool names are silently dropped ---

#[tokio::test]
async fn unknown_tool_name_means_direct_reply() {
    let h = harness(
        vec![
            Ok(r#"{"tool": "delete_everything", "params": {}}"#.into()),
            Ok("direct reply".into()),
        ],
        Ok(Value::Null),
    );

    let ack = send(&h.orchestrator, "do something").await;
    assert_eq!(ack, AckStatus::Sent);
    assert_eq!(h.backend.invocations(), 0);
    assert_eq!(h.channel.messages()[1].1, "direct reply");
}

// --- Information preservation on double failure ---

#[tokio::test]
async fn backend_failure_reason_survives_synthesis_failure() {
    let h = harness(
        vec![
            Ok(r#"{"tool": "get_environments", "params": {}}"#.into()),
            Err(ProviderError::Network("provider down".into())),
        ],
        Err(BackendError::Network("x".into())),
    );

    let ack = send(&h.orchestrator, "list my environments").await;
    assert_eq!(ack, AckStatus::Sent);

    // The failure reason must appear verbatim in the fallback reply.
    let reply = &h.channel.messages()[1].1;
    assert!(reply.contains("x"), "reply must carry the raw failure: {reply}");
    assert!(reply.contains("get_environments"));
}

// --- Exactly one reply XOR one error ack ---

#[tokio::test]
async fn successful_pipeline_broadcasts_once_and_acks_sent() {
    let h = harness(
        vec![Ok(r#"{"tool": null}"#.into()), Ok("hi".into())],
        Ok(Value::Null),
    );

    let ack = send(&h.orchestrator, "hello").await;
    assert_eq!(ack, AckStatus::Sent);

    let assistant_count = h
        .channel
        .messages()
        .iter()
        .filter(|(sender, _)| *sender == Sender::Assistant)
        .count();
    assert_eq!(assistant_count, 1);
    assert_eq!(h.channel.error_events(), 0);
}

#[tokio::test]
async fn broken_channel_acks_error_and_broadcasts_nothing() {
    let model = ScriptedModel::new(vec![]);
    let backend = ScriptedBackend::new(Ok(Value::Null));
    let channel = RecordingChannel::failing();
    let orchestrator = Orchestrator::new(
        model,
        backend.clone(),
        registry(),
        channel.clone(),
        Arc::new(EventBus::default()),
    );

    let ack = send(&orchestrator, "hello").await;
    assert!(matches!(ack, AckStatus::Error { .. }));
    assert!(channel.messages().is_empty());
    assert_eq!(backend.invocations(), 0);
}

struct PanickingChannel;

#[async_trait]
impl Channel for PanickingChannel {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundEvent>, ChannelError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn broadcast(&self, _event: Broadcast) -> Result<(), ChannelError> {
        panic!("broadcast exploded");
    }
}

#[tokio::test]
async fn panicking_channel_still_yields_error_ack() {
    let model = ScriptedModel::new(vec![]);
    let backend = ScriptedBackend::new(Ok(Value::Null));
    let orchestrator = Orchestrator::new(
        model,
        backend.clone(),
        registry(),
        Arc::new(PanickingChannel),
        Arc::new(EventBus::default()),
    );

    // The ack must arrive even though the channel panics on first broadcast.
    let ack = send(&orchestrator, "hello").await;
    match ack {
        AckStatus::Error { error } => assert!(error.contains("broadcast exploded")),
        AckStatus::Sent => panic!("expected an error ack"),
    }
    assert_eq!(backend.invocations(), 0);
}

// --- Deterministic orchestration ---

#[tokio::test]
async fn repeated_runs_with_fixed_stubs_are_identical() {
    let run = || async {
        let h = harness(
            vec![
                Ok(r#"{"tool": "create_environment", "params": {"name": "x"}}"#.into()),
            ],
            Ok(Value::Null),
        );
        let ack = send(&h.orchestrator, "create an environment").await;
        (ack, h.channel.messages())
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first.0, second.0);
    let first_texts: Vec<_> = first.1.iter().map(|(_, t)| t.clone()).collect();
    let second_texts: Vec<_> = second.1.iter().map(|(_, t)| t.clone()).collect();
    assert_eq!(first_texts, second_texts);
}

// --- Pipeline events are observable ---

#[tokio::test]
async fn pipeline_publishes_stage_events() {
    use opsrelay_core::event::PipelineEvent;

    let model = ScriptedModel::new(vec![
        Ok(r#"{"tool": "get_environments", "params": {}}"#.into()),
        Ok("done".into()),
    ]);
    let backend = ScriptedBackend::new(Ok(serde_json::json!([])));
    let channel = RecordingChannel::new();
    let events = Arc::new(EventBus::default());
    let mut rx = events.subscribe();

    let orchestrator = Orchestrator::new(model, backend, registry(), channel, events);
    let ack = send(&orchestrator, "list envs").await;
    assert_eq!(ack, AckStatus::Sent);

    let mut saw_received = false;
    let mut saw_invoked = false;
    let mut saw_delivered = false;
    while let Ok(event) = rx.try_recv() {
        match event.as_ref() {
            PipelineEvent::MessageReceived { .. } => saw_received = true,
            PipelineEvent::ToolInvoked { tool, success, .. } => {
                assert_eq!(tool, "get_environments");
                assert!(success);
                saw_invoked = true;
            }
            PipelineEvent::ReplyDelivered { used_tool, .. } => {
                assert!(used_tool);
                saw_delivered = true;
            }
            _ => {}
        }
    }
    assert!(saw_received && saw_invoked && saw_delivered);
}
