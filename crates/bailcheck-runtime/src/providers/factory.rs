//! Chat backends selected by name.
//!
//! `chat.provider` in the runtime config names a factory in the
//! [`ProviderRegistry`]; `chat.provider_config` is handed to it as JSON.
//! The registry validates that JSON before building anything, so a missing
//! key or malformed endpoint surfaces as `NotConfigured` at startup rather
//! than on the first chat request.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};

/// Builds one kind of chat backend from its JSON settings.
pub trait ProviderFactory: Send + Sync {
    /// Name used in `chat.provider`, e.g. "gemini".
    fn provider_type(&self) -> &'static str;

    /// Reject settings the backend cannot start with.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    /// Build the backend. Only called after `validate_config` passed.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;
}

/// Chat backends known to this build, keyed by provider type.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<&'static str, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory; a later one with the same type wins.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.provider_type(), factory);
    }

    /// Validate `config` for `provider_type`, then build the backend.
    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let factory = self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown chat provider '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })?;

        factory.validate_config(config)?;
        let provider = factory.create(config)?;
        tracing::debug!(provider = provider_type, "Chat provider ready");
        Ok(provider)
    }

    pub fn available_types(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Registry with the backends compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "gemini")]
        registry.register(Arc::new(super::GeminiProviderFactory));
        registry
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoProvider {
        label: String,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: messages.last().map(|m| m.content.clone()).unwrap_or_default(),
                usage: TokenUsage::default(),
                model: config.model.clone(),
                stop_reason: Some("STOP".to_string()),
            })
        }

        fn name(&self) -> &str {
            &self.label
        }
    }

    /// Requires a `label` setting and counts how often it builds.
    #[derive(Default)]
    struct EchoFactory {
        built: AtomicUsize,
    }

    impl ProviderFactory for EchoFactory {
        fn provider_type(&self) -> &'static str {
            "echo"
        }

        fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
            match config["label"].as_str() {
                Some(label) if !label.trim().is_empty() => Ok(()),
                _ => Err(ProviderError::NotConfigured("echo needs a label".to_string())),
            }
        }

        fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
            self.built.fetch_add(1, Ordering::SeqCst);
            let label = config["label"].as_str().unwrap_or_default().to_string();
            Ok(Arc::new(EchoProvider { label }))
        }
    }

    #[test]
    fn test_create_registered_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(EchoFactory::default()));

        let provider = registry
            .create("echo", &serde_json::json!({"label": "desk-1"}))
            .unwrap();
        assert_eq!(provider.name(), "desk-1");
        assert_eq!(registry.available_types(), vec!["echo"]);
    }

    #[test]
    fn test_invalid_settings_never_reach_create() {
        let factory = Arc::new(EchoFactory::default());
        let mut registry = ProviderRegistry::new();
        registry.register(factory.clone());

        for config in [serde_json::json!({}), serde_json::json!({"label": "  "})] {
            match registry.create("echo", &config) {
                Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains("label")),
                other => panic!("expected NotConfigured, got {:?}", other.map(|p| p.name().to_string())),
            }
        }
        assert_eq!(factory.built.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_provider_lists_available() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(EchoFactory::default()));

        match registry.create("openai", &serde_json::json!({})) {
            Err(ProviderError::NotConfigured(msg)) => {
                assert!(msg.contains("openai"));
                assert!(msg.contains("echo"));
            }
            other => panic!("expected NotConfigured, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[test]
    fn test_defaults_match_features() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(
            registry.available_types().contains(&"gemini"),
            cfg!(feature = "gemini")
        );
    }
}
