//! Runtime configuration.
//!
//! Loaded from YAML; every field has a default so an empty file (or no file)
//! yields a working configuration that uses the embedded rule catalogue.
//!
//! ```yaml
//! rules_path: ./rules/ipc.yaml
//! audit_log_limit: 100
//! chat:
//!   provider: gemini
//!   model: gemini-2.5-flash
//!   timeout: 15s
//!   max_retries: 2
//!   provider_config:
//!     base_url: https://generativelanguage.googleapis.com/v1beta
//! circuit_breaker:
//!   failure_threshold: 3
//!   recovery_timeout: 30
//!   success_threshold: 2
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use bailcheck_core::{RuleTable, RuleTableError};

use crate::providers::CompletionConfig;
use crate::resilience::CircuitBreakerConfig;

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Rule table file (YAML or JSON); the embedded catalogue when absent
    pub rules_path: Option<PathBuf>,

    /// Maximum audit entries returned by a listing
    pub audit_log_limit: usize,

    pub chat: ChatConfig,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            audit_log_limit: 100,
            chat: ChatConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.audit_log_limit == 0 {
            return Err(ConfigError::Invalid(
                "audit_log_limit must be greater than zero".to_string(),
            ));
        }
        if self.chat.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("chat.provider must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::Invalid(format!(
                "chat.temperature must be within 0.0..=2.0, got {}",
                self.chat.temperature
            )));
        }
        if !self.chat.provider_config.is_object() {
            return Err(ConfigError::Invalid(
                "chat.provider_config must be a mapping".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 || self.circuit_breaker.success_threshold == 0
        {
            return Err(ConfigError::Invalid(
                "circuit_breaker thresholds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the configured rule table, or the embedded catalogue.
    pub fn load_rules(&self) -> Result<RuleTable, RuleTableError> {
        match &self.rules_path {
            Some(path) => RuleTable::from_file(path),
            None => RuleTable::builtin(),
        }
    }
}

/// Chat assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Provider registry key
    pub provider: String,

    /// Provider-specific settings (api_key, base_url)
    pub provider_config: JsonValue,

    pub model: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Per-request timeout, e.g. "15s" or "1m 30s"
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    /// Retries after a rate-limit or timeout failure
    pub max_retries: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            provider_config: serde_json::json!({}),
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl ChatConfig {
    /// Completion settings derived from this chat configuration.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
