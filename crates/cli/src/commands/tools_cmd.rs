//! `opsrelay tools` — Inspect the catalog or call the backend directly.

use opsrelay_config::AppConfig;
use opsrelay_core::tool::{ToolBackend, ValidationOutcome};
use opsrelay_orchestrator::validate_params;
use opsrelay_tools::HttpToolBackend;
use serde_json::{Map, Value};

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = opsrelay_tools::registry_from_config(&config);

    println!("Registered tools:");
    for descriptor in registry.descriptors() {
        println!("  {}", descriptor.name);
        if descriptor.required_params.is_empty() {
            println!("    (no required parameters)");
        }
        for param in &descriptor.required_params {
            match descriptor.descriptions.get(param) {
                Some(desc) if !desc.is_empty() => println!("    {param} (required) — {desc}"),
                _ => println!("    {param} (required)"),
            }
        }
    }
    Ok(())
}

pub async fn call(name: &str, params: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let params: Map<String, Value> =
        serde_json::from_str(params).map_err(|e| format!("--params must be a JSON object: {e}"))?;

    let registry = opsrelay_tools::registry_from_config(&config);
    let Some(descriptor) = registry.get(name) else {
        return Err(format!("Unknown tool: {name}").into());
    };
    if let ValidationOutcome::Invalid(missing) = validate_params(descriptor, &params) {
        return Err(format!("Missing required parameters: {}", missing.join(", ")).into());
    }

    let backend = HttpToolBackend::from_config(&config.backend);
    match backend.execute(name, &params).await {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(e) => {
            eprintln!("Tool call failed: {e}");
            return Err(e.to_string().into());
        }
    }
    Ok(())
}
