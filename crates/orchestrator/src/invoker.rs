//! Tool invocation against the external backend.
//!
//! One attempt per call, no retries. Every transport, authentication, or
//! backend-side error is converted to `ToolResult::Failure` — the invoker
//! never propagates an error past its own boundary.

use std::sync::Arc;

use opsrelay_core::tool::{ToolBackend, ToolResult};
use serde_json::{Map, Value};
use tracing::warn;

pub struct ToolInvoker {
    backend: Arc<dyn ToolBackend>,
}

impl ToolInvoker {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }

    /// Execute a validated tool call and return its outcome as data.
    pub async fn invoke(&self, name: &str, params: &Map<String, Value>) -> ToolResult {
        match self.backend.execute(name, params).await {
            Ok(value) => ToolResult::success(value),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                ToolResult::failure(e.to_string())
            }
        }
    }
}
