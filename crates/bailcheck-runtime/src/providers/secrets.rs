//! Credential handling for LLM providers.
//!
//! Using this module ensures:
//!
//! - **No accidental logging**: Credentials cannot appear in Debug/Display output
//! - **Memory safety**: Credentials are zeroed on drop
//! - **Placeholder detection**: Template values from sample `.env` files count as unset
//!
//! ## Usage
//!
//! ```ignore
//! use crate::providers::secrets::ApiCredential;
//!
//! // Load from config with env fallback
//! let cred = ApiCredential::from_config_or_env(&config, "api_key", "GEMINI_API_KEY", "Gemini API key")?;
//!
//! // Use in HTTP header (explicit exposure)
//! request.header("x-goog-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Values shipped in sample environment files that must not be sent upstream.
const PLACEHOLDER_VALUES: &[&str] = &["your_gemini_api_key_here", "changeme", "<api-key>"];

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from configuration file/JSON
    Config,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// - Debug and Display show `[REDACTED]`
/// - The value is zeroed on drop via `secrecy`
/// - Exposure is explicit via `.expose()`
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Create a new credential from a string value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Whether `value` is empty or a known placeholder.
    pub fn is_unusable(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed)
    }

    /// Load credential from JSON config, falling back to environment variable.
    ///
    /// 1. Use `config_key` from the JSON config if it holds a usable value
    /// 2. Otherwise use `env_var` if it holds a usable value
    /// 3. Otherwise fail with `NotConfigured`
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[config_key].as_str() {
            if !Self::is_unusable(value) {
                return Ok(Self::new(value, CredentialSource::Config, name));
            }
        }

        if let Ok(value) = std::env::var(env_var) {
            if !Self::is_unusable(&value) {
                return Ok(Self::new(value, CredentialSource::Environment, name));
            }
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or {} environment variable",
            name, config_key, env_var
        )))
    }

    /// Check if a usable credential is available (without loading it).
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        let in_config = config[config_key]
            .as_str()
            .is_some_and(|v| !Self::is_unusable(v));
        let in_env = std::env::var(env_var).is_ok_and(|v| !Self::is_unusable(&v));
        in_config || in_env
    }

    /// Expose the credential value at the point of use (e.g. an HTTP header).
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug_and_display() {
        let secret = "AIza-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Config, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("config"));
    }

    #[test]
    fn test_credential_expose() {
        let cred = ApiCredential::new("key-1", CredentialSource::Programmatic, "Test");
        assert_eq!(cred.expose(), "key-1");
        assert_eq!(cred.source(), CredentialSource::Programmatic);
    }

    #[test]
    fn test_config_takes_precedence() {
        let config = serde_json::json!({ "api_key": "config-key" });
        std::env::set_var("BAILCHECK_TEST_KEY_PRIORITY", "env-key");
        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "BAILCHECK_TEST_KEY_PRIORITY",
            "Test key",
        )
        .unwrap();
        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source(), CredentialSource::Config);
        std::env::remove_var("BAILCHECK_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_placeholder_in_config_falls_back_to_env() {
        let config = serde_json::json!({ "api_key": "your_gemini_api_key_here" });
        std::env::set_var("BAILCHECK_TEST_KEY_PLACEHOLDER", "env-key");
        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "BAILCHECK_TEST_KEY_PLACEHOLDER",
            "Test key",
        )
        .unwrap();
        assert_eq!(cred.source(), CredentialSource::Environment);
        std::env::remove_var("BAILCHECK_TEST_KEY_PLACEHOLDER");
    }

    #[test]
    fn test_missing_credential_names_both_sources() {
        let result = ApiCredential::from_config_or_env(
            &serde_json::json!({}),
            "api_key",
            "BAILCHECK_NONEXISTENT_VAR",
            "Test key",
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("api_key"));
        assert!(message.contains("BAILCHECK_NONEXISTENT_VAR"));
    }

    #[test]
    fn test_is_available_rejects_placeholder() {
        let placeholder = serde_json::json!({ "api_key": "your_gemini_api_key_here" });
        assert!(!ApiCredential::is_available(
            &placeholder,
            "api_key",
            "BAILCHECK_NONEXISTENT_VAR"
        ));
        let real = serde_json::json!({ "api_key": "real" });
        assert!(ApiCredential::is_available(
            &real,
            "api_key",
            "BAILCHECK_NONEXISTENT_VAR"
        ));
    }
}
