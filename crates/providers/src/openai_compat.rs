//! OpenAI-compatible language model client.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, and any endpoint exposing a
//! `/v1/chat/completions`-shaped API. The pipeline needs exactly one
//! capability from it: ordered prompt in, raw text out.

use async_trait::async_trait;
use opsrelay_core::error::ProviderError;
use opsrelay_core::model::{ChatRole, LanguageModel, PromptMessage};
use serde::Deserialize;
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completions client.
pub struct OpenAiCompatModel {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatModel {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            client,
        }
    }

    fn to_api_messages(messages: &[PromptMessage]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": match m.role {
                        ChatRole::System => "system",
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect()
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatModel {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &self,
        messages: &[PromptMessage],
    ) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages),
            "temperature": self.temperature,
            "stream": false,
        });

        debug!(model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

// --- Wire format structs ---

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}
