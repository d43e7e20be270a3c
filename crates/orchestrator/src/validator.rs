//! Parameter validation against a tool's schema.
//!
//! Pure: no I/O, no side effects. The missing set is collected eagerly so the
//! caller can report every missing field in one message, in the order the
//! registry declares them.

use opsrelay_core::tool::{ToolDescriptor, ValidationOutcome};
use serde_json::{Map, Value};

/// Check a parameter map for completeness against a descriptor.
///
/// A parameter counts as present when the key maps to a value that is not
/// JSON null and not an empty string.
pub fn validate_params(descriptor: &ToolDescriptor, params: &Map<String, Value>) -> ValidationOutcome {
    let missing: Vec<String> = descriptor
        .required_params
        .iter()
        .filter(|name| !is_present(params.get(name.as_str())))
        .cloned()
        .collect();

    if missing.is_empty() {
        ValidationOutcome::Valid
    } else {
        ValidationOutcome::Invalid(missing)
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
