//! The per-message tool-orchestration pipeline.
//!
//! For each inbound user message the orchestrator decides whether the message
//! expresses intent to invoke a backend tool, validates and executes the call
//! if so, and produces exactly one assistant reply:
//!
//! ```text
//! Received → IntentExtracted → {NoTool | ParamsChecked}
//!          → {Skipped | Invoked} → Synthesized → Delivered
//! ```
//!
//! Every expected failure (malformed intent JSON, unknown tool, missing
//! params, backend failure, model-call failure) is recovered into a
//! chat-shaped assistant message; only defect-level failures abort with an
//! error acknowledgment instead.

pub mod extractor;
pub mod invoker;
pub mod pipeline;
pub mod prompts;
pub mod synthesizer;
pub mod validator;

pub use extractor::IntentExtractor;
pub use invoker::ToolInvoker;
pub use pipeline::Orchestrator;
pub use synthesizer::ResponseSynthesizer;
pub use validator::validate_params;
