//! Tool schema and result types, plus the backend abstraction.
//!
//! The schema registry is a static table built at startup and shared
//! read-only across the pipeline. The `ToolBackend` trait is the single
//! external capability the invoker depends on; its transport is opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::BackendError;

/// Static schema for one tool: its name, required parameters (in the order
/// they should be reported when missing), and human-readable descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name, exact-match key into the registry.
    pub name: String,

    /// Required parameter names, in declaration order.
    #[serde(default)]
    pub required_params: Vec<String>,

    /// Parameter name → human-readable description (sent to the model).
    #[serde(default)]
    pub descriptions: HashMap<String, String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_params: Vec::new(),
            descriptions: HashMap::new(),
        }
    }

    pub fn required(mut self, param: impl Into<String>, description: impl Into<String>) -> Self {
        let param = param.into();
        self.descriptions.insert(param.clone(), description.into());
        self.required_params.push(param);
        self
    }

    pub fn optional(mut self, param: impl Into<String>, description: impl Into<String>) -> Self {
        self.descriptions.insert(param.into(), description.into());
        self
    }
}

/// The outcome of checking a parameter map against a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// All required parameters are present.
    Valid,
    /// These required parameters are missing, in registry-declared order.
    Invalid(Vec<String>),
}

/// The outcome of one tool invocation. Never re-validated downstream —
/// the synthesizer receives it opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResult {
    /// The backend returned a value.
    Success { value: Value },
    /// The backend (or its transport) failed.
    Failure { reason: String },
}

impl ToolResult {
    pub fn success(value: Value) -> Self {
        Self::Success { value }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Canonical serialized form, used in synthesis prompts and in the
    /// post-processing fallback reply so no information is dropped.
    pub fn serialized(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| match self {
            Self::Success { .. } => r#"{"status":"success"}"#.into(),
            Self::Failure { reason } => format!("{{\"status\":\"failure\",\"reason\":{reason:?}}}"),
        })
    }
}

/// The registry of tool schemas, loaded once at process start.
///
/// Read-only after initialization; requires no locking. The intent extractor
/// uses the names to constrain what the model may propose, the validator uses
/// the required-parameter lists.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tools: HashMap<String, ToolDescriptor>,
    /// Registration order, so prompts and listings are deterministic.
    order: Vec<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Replaces any existing tool with the same name.
    pub fn register(&mut self, descriptor: ToolDescriptor) {
        let name = descriptor.name.clone();
        if self.tools.insert(name.clone(), descriptor).is_none() {
            self.order.push(name);
        }
    }

    /// Look up a descriptor by exact name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Whether a name refers to a known tool (case-sensitive exact match).
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered tool names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// All descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order.iter().filter_map(|n| self.tools.get(n))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// The remote tool-execution backend, reachable by tool name.
///
/// Implementations handle transport and authentication. Exactly one attempt
/// per call; retries, if desired, are a backend-client concern.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Execute a tool and return its raw JSON result.
    async fn execute(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> std::result::Result<Value, BackendError>;
}
