//! HTTP client for the resource-management backend.
//!
//! Implements `ToolBackend` by mapping each catalog variant to its REST call.
//! When the backend requires token auth, the token is fetched from the
//! configured auth endpoint and cached until shortly before it expires;
//! the upstream token lifetime is 24 h, so the cache keeps it for 23.5 h.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use opsrelay_core::error::BackendError;
use opsrelay_core::tool::ToolBackend;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::KnownTool;

const TOKEN_LIFETIME_MINS: i64 = (23 * 60) + 30;

/// Authentication settings for the backend's token endpoint.
#[derive(Debug, Clone)]
pub struct BackendAuth {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub domain: String,
    pub project: String,
}

struct CachedToken {
    token: String,
    fetched_at: DateTime<Utc>,
}

/// A `ToolBackend` speaking the resource-management API's REST dialect.
pub struct HttpToolBackend {
    base_url: String,
    auth: Option<BackendAuth>,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl HttpToolBackend {
    pub fn new(base_url: impl Into<String>, auth: Option<BackendAuth>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            client,
            token: Mutex::new(None),
        }
    }

    /// Build a backend from config. Auth is enabled only when the config
    /// carries a complete credential set.
    pub fn from_config(config: &opsrelay_config::BackendConfig) -> Self {
        let auth = match (&config.auth_url, &config.username, &config.password) {
            (Some(auth_url), Some(username), Some(password)) => Some(BackendAuth {
                auth_url: auth_url.clone(),
                username: username.clone(),
                password: password.clone(),
                domain: config.domain.clone().unwrap_or_default(),
                project: config.project.clone().unwrap_or_default(),
            }),
            _ => None,
        };
        Self::new(&config.base_url, auth, config.timeout_secs)
    }

    /// Whether a cached token is still usable.
    fn token_is_fresh(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - fetched_at < Duration::minutes(TOKEN_LIFETIME_MINS)
    }

    /// Get a valid auth token, fetching a new one if the cache is stale.
    async fn auth_token(&self, auth: &BackendAuth) -> Result<String, BackendError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Self::token_is_fresh(cached.fetched_at, Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        debug!(url = %auth.auth_url, "Fetching backend auth token");

        let body = serde_json::json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "domain": { "name": auth.domain },
                            "name": auth.username,
                            "password": auth.password,
                        }
                    }
                },
                "scope": {
                    "domain": { "name": auth.domain },
                    "project": { "name": auth.project },
                }
            }
        });

        let response = self
            .client
            .post(&auth.auth_url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(BackendError::AuthenticationFailed(format!(
                "token endpoint returned status {status}"
            )));
        }

        let token = response
            .headers()
            .get("x-subject-token")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                BackendError::AuthenticationFailed("No x-subject-token in response".into())
            })?;

        info!("Backend auth token refreshed");
        *guard = Some(CachedToken {
            token: token.clone(),
            fetched_at: Utc::now(),
        });
        Ok(token)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let request = if let Some(auth) = &self.auth {
            let token = self.auth_token(auth).await?;
            request.header("X-Auth-Token", token)
        } else {
            request
        };

        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(e.to_string())
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Backend returned error");
            return Err(BackendError::ApiError {
                status_code: status,
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to parse backend response: {e}")))
    }

    async fn get_environments(&self, params: &Map<String, Value>) -> Result<Value, BackendError> {
        let offset = params.get("offset").and_then(Value::as_u64).unwrap_or(0);
        let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(100);

        let request = self
            .client
            .get(format!("{}/environments", self.base_url))
            .query(&[("offset", offset), ("limit", limit)]);
        self.send(request).await
    }

    async fn create_environment(&self, params: &Map<String, Value>) -> Result<Value, BackendError> {
        let request = self
            .client
            .post(format!("{}/environments", self.base_url))
            .json(&Value::Object(params.clone()));
        self.send(request).await
    }

    async fn get_gitops_runtime(&self, params: &Map<String, Value>) -> Result<Value, BackendError> {
        let query: Vec<(&str, String)> = ["environment_id", "resource_id", "resource_type"]
            .iter()
            .filter_map(|key| {
                params
                    .get(*key)
                    .and_then(Value::as_str)
                    .map(|v| (*key, v.to_string()))
            })
            .collect();

        let request = self
            .client
            .get(format!("{}/gitops-runtime", self.base_url))
            .query(&query);
        self.send(request).await
    }
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    async fn execute(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, BackendError> {
        let tool =
            KnownTool::parse(name).ok_or_else(|| BackendError::UnknownTool(name.to_string()))?;

        debug!(tool = %tool, "Executing backend tool");

        match tool {
            KnownTool::GetEnvironments => self.get_environments(params).await,
            KnownTool::CreateEnvironment => self.create_environment(params).await,
            KnownTool::GetGitopsRuntime => self.get_gitops_runtime(params).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_reused() {
        let fetched = Utc::now() - Duration::hours(1);
        assert!(HttpToolBackend::token_is_fresh(fetched, Utc::now()));
    }

    #[test]
    fn stale_token_is_refreshed() {
        let fetched = Utc::now() - Duration::hours(24);
        assert!(!HttpToolBackend::token_is_fresh(fetched, Utc::now()));
    }

    #[test]
    fn token_boundary_is_just_under_expiry() {
        let now = Utc::now();
        let boundary = now - Duration::minutes(TOKEN_LIFETIME_MINS);
        assert!(!HttpToolBackend::token_is_fresh(boundary, now));
        assert!(HttpToolBackend::token_is_fresh(
            boundary + Duration::minutes(1),
            now
        ));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_network() {
        let backend = HttpToolBackend::new("http://localhost:3000", None, 5);
        let err = backend
            .execute("not_a_tool", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownTool(_)));
    }

    #[test]
    fn from_config_without_credentials_disables_auth() {
        let config = opsrelay_config::BackendConfig::default();
        let backend = HttpToolBackend::from_config(&config);
        assert!(backend.auth.is_none());
    }
}
