//! `opsrelay chat` — Interactive or single-message chat, in-process.
//!
//! Wires the same pipeline the gateway runs, but with a local session
//! instead of a WebSocket. Each message is sent, its ack awaited, and the
//! buffered broadcast frames printed.

use std::io::Write;
use std::sync::Arc;

use opsrelay_channels::WebChannel;
use opsrelay_config::AppConfig;
use opsrelay_core::channel::{AckStatus, Broadcast, Channel, InboundEvent};
use opsrelay_core::event::EventBus;
use opsrelay_core::message::Sender;
use opsrelay_core::tool::ToolBackend;
use opsrelay_orchestrator::Orchestrator;
use opsrelay_tools::HttpToolBackend;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPSRELAY_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let model = opsrelay_providers::build_from_config(&config);
    let backend: Arc<dyn ToolBackend> = Arc::new(HttpToolBackend::from_config(&config.backend));
    let registry = Arc::new(opsrelay_tools::registry_from_config(&config));
    let channel = Arc::new(WebChannel::new());
    let events = Arc::new(EventBus::default());

    let inbound = channel.start().await?;
    let orchestrator = Arc::new(Orchestrator::new(
        model,
        backend,
        registry,
        channel.clone(),
        events,
    ));
    tokio::spawn(orchestrator.serve(inbound));

    let session = channel.register_session("cli").await;

    if let Some(text) = message {
        let mut session = session;
        exchange(&channel, &mut session, &text).await?;
        return Ok(());
    }

    println!("opsrelay chat — type a message, or 'exit' to quit.");
    let mut session = session;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }
        exchange(&channel, &mut session, text).await?;
    }

    channel.stop().await?;
    Ok(())
}

/// Send one message, wait for its ack, and print the buffered frames.
///
/// The pipeline broadcasts to the session before acking, so by the time the
/// ack resolves every frame for this exchange is already buffered.
async fn exchange(
    channel: &WebChannel,
    session: &mut mpsc::Receiver<String>,
    text: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = oneshot::channel();
    channel.inject(InboundEvent::with_ack(text, tx)).await?;

    match rx.await {
        Ok(AckStatus::Sent) => {}
        Ok(AckStatus::Error { error }) => eprintln!("  [error] {error}"),
        Err(_) => eprintln!("  [error] pipeline dropped the message"),
    }

    while let Ok(frame) = session.try_recv() {
        if let Ok(event) = serde_json::from_str::<Broadcast>(&frame) {
            match event {
                Broadcast::Message(msg) if msg.sender == Sender::Assistant => {
                    println!("{}", msg.text);
                }
                Broadcast::Error { message } => eprintln!("  [error] {message}"),
                Broadcast::Message(_) => {}
            }
        }
    }
    Ok(())
}
