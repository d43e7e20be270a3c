//! Intent and reply-context value objects.
//!
//! A `ToolIntent` is the structured decision extracted from a free-text user
//! message: either "invoke this tool with these parameters" or "no tool".
//! A `ReplyContext` is the complete, immutable input to response synthesis.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tool::ToolResult;

/// The structured decision derived from one user message.
///
/// `tool_name = None` means "no tool requested" and is terminal for the
/// message's tool path. Produced fresh per message; never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolIntent {
    /// The tool the model wants to invoke, if any.
    pub tool_name: Option<String>,

    /// Key/value parameters for the tool call.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ToolIntent {
    /// The "no tool intended" intent. Malformed model output collapses to this.
    pub fn none() -> Self {
        Self {
            tool_name: None,
            params: Map::new(),
        }
    }

    /// An intent to invoke a specific tool.
    pub fn invoke(tool_name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            params,
        }
    }
}

/// The complete input to response synthesis.
///
/// Invariant: `invoked_tool` is set if and only if `tool_result` is set.
/// The constructors are the only way to build one, so the invariant holds
/// by construction.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    /// The user's original message text.
    pub original_message: String,

    /// Which tool was invoked for this message, if any.
    pub invoked_tool: Option<String>,

    /// The tool's outcome, passed through opaquely.
    pub tool_result: Option<ToolResult>,
}

impl ReplyContext {
    /// Context for direct synthesis — no tool was used.
    pub fn direct(original_message: impl Into<String>) -> Self {
        Self {
            original_message: original_message.into(),
            invoked_tool: None,
            tool_result: None,
        }
    }

    /// Context for post-processing synthesis — a tool ran and produced a result.
    pub fn after_tool(
        original_message: impl Into<String>,
        tool_name: impl Into<String>,
        result: ToolResult,
    ) -> Self {
        Self {
            original_message: original_message.into(),
            invoked_tool: Some(tool_name.into()),
            tool_result: Some(result),
        }
    }
}
