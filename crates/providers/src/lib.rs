//! Language model provider implementations for opsrelay.
//!
//! All providers implement the `opsrelay_core::LanguageModel` trait. The
//! orchestrator never knows which backend answers its prompts.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatModel;

use std::sync::Arc;

/// Build the configured language model client.
pub fn build_from_config(config: &opsrelay_config::AppConfig) -> Arc<dyn opsrelay_core::LanguageModel> {
    let api_key = config.provider.api_key.clone().unwrap_or_default();
    Arc::new(OpenAiCompatModel::new(
        &config.provider.api_url,
        api_key,
        &config.provider.model,
        config.provider.temperature,
    ))
}
