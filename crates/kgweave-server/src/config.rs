//! Configuration for the kgweave server
//!
//! This module contains the configuration types and loading functionality.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use kgweave_core::{ColorRule, DEFAULT_COLOR};

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// `memory://...` or `drive://...`
    #[serde(default = "default_document_store_url")]
    pub document_store_url: String,

    /// OAuth access token for Google Drive
    #[serde(default)]
    pub drive_access_token: Option<String>,

    #[serde(default = "default_drive_api_base_url")]
    pub drive_api_base_url: String,

    /// OpenRouter API key
    #[serde(default)]
    pub completion_api_key: Option<String>,

    #[serde(default = "default_completion_api_url")]
    pub completion_api_url: String,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for outgoing HTTP requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// `role`, `initial` or `fixed`
    #[serde(default = "default_node_color_rule")]
    pub node_color_rule: String,
}

fn default_port() -> u16 {
    4000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_document_store_url() -> String {
    "memory://local".to_string()
}

fn default_drive_api_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_completion_api_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_completion_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_tokens() -> u32 {
    800
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_node_color_rule() -> String {
    "role".to_string()
}

/// Parses env var `name` into `target`, keeping the old value and warning on failure.
fn parse_var<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = env::var(name) {
        match raw.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!("Invalid {} value: {}", name, raw),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override from environment variables
        parse_var("SERVER_PORT", &mut config.port);

        if let Ok(host) = env::var("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(log_format) = env::var("LOG_FORMAT") {
            config.log_format = log_format.to_lowercase();
        }

        if let Ok(url) = env::var("DOCUMENT_STORE_URL") {
            config.document_store_url = url;
        }

        if let Ok(token) = env::var("DRIVE_ACCESS_TOKEN") {
            config.drive_access_token = Some(token);
        }

        if let Ok(url) = env::var("DRIVE_API_BASE_URL") {
            config.drive_api_base_url = url;
        }

        if let Ok(key) = env::var("OPENROUTER_API_KEY") {
            config.completion_api_key = Some(key);
        }

        if let Ok(url) = env::var("COMPLETION_API_URL") {
            config.completion_api_url = url;
        }

        if let Ok(model) = env::var("COMPLETION_MODEL") {
            config.completion_model = model;
        }

        parse_var("COMPLETION_TEMPERATURE", &mut config.temperature);
        parse_var("COMPLETION_MAX_TOKENS", &mut config.max_tokens);
        parse_var("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs);

        if let Ok(rule) = env::var("NODE_COLOR_RULE") {
            config.node_color_rule = rule.to_lowercase();
        }

        config.validate()?;

        // Add warnings for missing optional fields
        if config.completion_api_key.is_none() {
            warn!("No OPENROUTER_API_KEY provided - graph generation will fail!");
        }

        info!("Loaded server configuration");
        Ok(config)
    }

    /// Checks values that cannot be fixed up with a default.
    pub fn validate(&self) -> ServerResult<()> {
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err(ServerError::ConfigError(format!(
                "Unsupported log format: {}",
                self.log_format
            )));
        }

        if self.document_store_url.starts_with("drive://") && self.drive_access_token.is_none() {
            return Err(ServerError::ConfigError(
                "DRIVE_ACCESS_TOKEN is required for the drive:// document store".to_string(),
            ));
        }

        if !self.document_store_url.starts_with("drive://") && !self.document_store_url.starts_with("memory://") {
            return Err(ServerError::ConfigError(format!(
                "Unsupported document store URL: {}",
                self.document_store_url
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ServerError::ConfigError("REQUEST_TIMEOUT_SECS must be positive".to_string()));
        }

        self.color_rule().map(|_| ())
    }

    /// Node color rule selected by `node_color_rule`.
    pub fn color_rule(&self) -> ServerResult<ColorRule> {
        match self.node_color_rule.as_str() {
            "role" => Ok(ColorRule::ByRole),
            "initial" => Ok(ColorRule::ByInitial),
            "fixed" => Ok(ColorRule::Fixed(DEFAULT_COLOR.to_string())),
            other => Err(ServerError::ConfigError(format!("Unknown node color rule: {}", other))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            document_store_url: default_document_store_url(),
            drive_access_token: None,
            drive_api_base_url: default_drive_api_base_url(),
            completion_api_key: None,
            completion_api_url: default_completion_api_url(),
            completion_model: default_completion_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            node_color_rule: default_node_color_rule(),
        }
    }
}
