//! Intent extraction — the first model round-trip.
//!
//! The model is asked for a strict two-field JSON object naming a tool (or
//! null) and its parameters. Anything that is not that shape — a model-call
//! failure, prose, truncated JSON, a non-string tool field — collapses to
//! "no tool intended". Malformed output is never surfaced to the user.

use std::sync::Arc;

use opsrelay_core::intent::ToolIntent;
use opsrelay_core::model::LanguageModel;
use opsrelay_core::tool::SchemaRegistry;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::prompts;

/// The two-field shape the model is instructed to reply with.
#[derive(Deserialize)]
struct WireIntent {
    tool: Option<Value>,
    #[serde(default)]
    params: Map<String, Value>,
}

pub struct IntentExtractor {
    model: Arc<dyn LanguageModel>,
    registry: Arc<SchemaRegistry>,
}

impl IntentExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, registry: Arc<SchemaRegistry>) -> Self {
        Self { model, registry }
    }

    /// Extract the tool intent from one user message.
    ///
    /// Infallible by contract: every failure mode degrades to
    /// `ToolIntent::none()`.
    pub async fn extract(&self, message: &str) -> ToolIntent {
        let prompt = prompts::intent_messages(&self.registry, message);

        let raw = match self.model.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Intent extraction model call failed, treating as no tool");
                return ToolIntent::none();
            }
        };

        Self::parse(&raw)
    }

    /// Parse the model's raw output into an intent.
    fn parse(raw: &str) -> ToolIntent {
        let wire: WireIntent = match serde_json::from_str(raw.trim()) {
            Ok(wire) => wire,
            Err(e) => {
                debug!(error = %e, "Model output was not intent JSON, treating as no tool");
                return ToolIntent::none();
            }
        };

        let name = match wire.tool {
            Some(Value::String(name)) => name.trim().to_string(),
            _ => return ToolIntent::none(),
        };

        if name.is_empty() {
            return ToolIntent::none();
        }

        ToolIntent::invoke(name, wire.params)
    }
}
