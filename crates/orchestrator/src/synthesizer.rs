//! Response synthesis — the second model round-trip.
//!
//! Direct mode prompts with the assistant persona and the original message
//! only. Post-processing mode additionally carries the tool name and its
//! serialized outcome and asks for a reply tailored to the user's intent.
//! A model-call failure never escapes: direct mode falls back to a fixed
//! apology, post-processing mode to a fallback that still carries the raw
//! serialized result so nothing is silently dropped.

use std::sync::Arc;

use opsrelay_core::intent::ReplyContext;
use opsrelay_core::model::LanguageModel;
use tracing::warn;

use crate::prompts;

const DIRECT_FALLBACK: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";

pub struct ResponseSynthesizer {
    model: Arc<dyn LanguageModel>,
}

impl ResponseSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Produce the final reply text for a message. Infallible by contract.
    pub async fn synthesize(&self, context: &ReplyContext) -> String {
        let prompt = match context.invoked_tool {
            None => prompts::direct_messages(&context.original_message),
            Some(_) => prompts::post_processing_messages(context),
        };

        match self.model.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Synthesis model call failed, using fallback reply");
                Self::fallback(context)
            }
        }
    }

    fn fallback(context: &ReplyContext) -> String {
        match (&context.invoked_tool, &context.tool_result) {
            (Some(tool), Some(result)) => format!(
                "I ran `{tool}` but couldn't compose a summary of the outcome. \
                 Raw result: {}",
                result.serialized()
            ),
            _ => DIRECT_FALLBACK.to_string(),
        }
    }
}
