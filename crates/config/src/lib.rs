//! Configuration loading, validation, and management for opsrelay.
//!
//! Loads configuration from `~/.opsrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use opsrelay_core::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.opsrelay/config.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Language model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Tool-execution backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Gateway (WebSocket server) settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Extra tool descriptors, merged into the built-in catalog
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; falls back to OPSRELAY_API_KEY / OPENAI_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the resource-management API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Token endpoint for backend authentication (optional; unauthenticated
    /// backends leave this unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:3000".into()
}
fn default_backend_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            auth_url: None,
            username: None,
            password: None,
            domain: None,
            project: None,
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("domain", &self.domain)
            .field("project", &self.project)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3001
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// A user-supplied tool descriptor from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,

    #[serde(default)]
    pub required_params: Vec<String>,

    #[serde(default)]
    pub descriptions: HashMap<String, String>,
}

impl From<ToolConfig> for ToolDescriptor {
    fn from(tc: ToolConfig) -> Self {
        ToolDescriptor {
            name: tc.name,
            required_params: tc.required_params,
            descriptions: tc.descriptions,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("backend", &self.backend)
            .field("gateway", &self.gateway)
            .field("tools", &self.tools)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path with env overrides.
    ///
    /// Environment variables (highest priority):
    /// - `OPSRELAY_API_KEY`, then `OPENAI_API_KEY`
    /// - `OPSRELAY_MODEL`
    /// - `OPSRELAY_BACKEND_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("OPSRELAY_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("OPSRELAY_MODEL") {
            config.provider.model = model;
        }

        if let Ok(url) = std::env::var("OPSRELAY_BACKEND_URL") {
            config.backend.base_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".opsrelay")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.backend.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.base_url must not be empty".into(),
            ));
        }

        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "tool names must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Check if a provider API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
