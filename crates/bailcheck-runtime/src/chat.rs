//! Legal chat assistant.
//!
//! Wraps an [`LlmProvider`] with the Indian-law system instruction, history
//! normalisation, retry on transient failures and a per-provider circuit
//! breaker.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::prompts;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError, ProviderRegistry};
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Errors from the chat assistant.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Provider '{0}' is temporarily unavailable")]
    Unavailable(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A reply from the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Chat assistant bound to one provider.
pub struct ChatAssistant {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl ChatAssistant {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        completion: CompletionConfig,
        retry: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            provider,
            completion,
            retry,
            breaker,
        }
    }

    /// Build an assistant from runtime configuration.
    ///
    /// Fails with `NotConfigured` when the provider is unknown or has no
    /// usable credential.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, ChatError> {
        let provider = registry.create(&config.chat.provider, &config.chat.provider_config)?;
        Ok(Self::new(
            provider,
            config.chat.completion_config(),
            RetryPolicy::new(config.chat.max_retries),
            Arc::new(CircuitBreaker::new(config.circuit_breaker.clone())),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Answer `message` in the context of earlier turns.
    pub async fn reply(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let provider_name = self.provider.name().to_string();
        if self.breaker.is_open(&provider_name) {
            tracing::warn!(provider = %provider_name, "Chat refused, circuit open");
            return Err(ChatError::Unavailable(provider_name));
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompts::system_instruction()));
        messages.extend(normalize_history(history));
        messages.push(ChatMessage::user(message));

        let provider = &self.provider;
        let completion = &self.completion;
        let result = self
            .retry
            .run(|| {
                let messages = messages.clone();
                async move { provider.complete(messages, completion).await }
            })
            .await;

        match result {
            Ok(response) => {
                self.breaker.record_success(&provider_name);
                tracing::debug!(
                    provider = %provider_name,
                    tokens = response.usage.total(),
                    "Chat reply generated"
                );
                Ok(ChatReply {
                    response: response.content,
                })
            }
            Err(err) => {
                self.breaker.record_failure(&provider_name);
                tracing::warn!(provider = %provider_name, error = %err, "Chat completion failed");
                Err(err.into())
            }
        }
    }
}

/// Prepare client-supplied history for the provider.
///
/// `model` is accepted as an alias for `assistant`. System turns are dropped
/// since the assistant supplies its own instruction, and leading assistant
/// turns are dropped so the conversation opens with a user turn.
pub fn normalize_history(history: &[ChatMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .filter(|msg| !msg.is_system())
        .map(|msg| match msg.role.as_str() {
            "model" | ChatMessage::ASSISTANT => ChatMessage::assistant(msg.content.clone()),
            _ => ChatMessage::user(msg.content.clone()),
        })
        .skip_while(|msg| msg.role == ChatMessage::ASSISTANT)
        .collect()
}
