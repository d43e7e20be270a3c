//! Tool catalog and backend client for opsrelay.
//!
//! The catalog is a closed enum of the operations the resource-management
//! backend exposes; the schema registry the pipeline validates against is
//! built from it (plus any extra descriptors from config). The backend
//! client speaks the API's REST dialect and handles its token dance.

pub mod backend;
pub mod catalog;

pub use backend::HttpToolBackend;
pub use catalog::KnownTool;

use opsrelay_core::tool::SchemaRegistry;

/// Create a registry with the built-in tool catalog.
pub fn builtin_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for tool in KnownTool::ALL {
        registry.register(tool.descriptor());
    }
    registry
}

/// Create a registry from the built-in catalog plus config-supplied extras.
pub fn registry_from_config(config: &opsrelay_config::AppConfig) -> SchemaRegistry {
    let mut registry = builtin_registry();
    for tool in &config.tools {
        registry.register(tool.clone().into());
    }
    registry
}
