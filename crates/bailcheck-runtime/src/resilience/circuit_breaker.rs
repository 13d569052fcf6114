//! Circuit breaker to stop calling a provider that keeps failing.
//!
//! When completions fail repeatedly the circuit opens and the assistant
//! answers with an "unavailable" error instead of waiting on the network.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery (in seconds)
    #[serde(with = "duration_secs")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Calls are refused until the recovery timeout passes
    Open { opened_at: Instant },

    /// Testing if circuit can close
    HalfOpen { successes: u32 },
}

/// Circuit breaker with one circuit per provider name.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Check if the circuit for `provider` refuses calls.
    pub fn is_open(&self, provider: &str) -> bool {
        let states = self.states.read();
        match states.get(provider) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(provider);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Record a successful completion.
    pub fn record_success(&self, provider: &str) {
        let mut states = self.states.write();
        match states.get(provider).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(provider.to_string(), CircuitState::Closed { failures: 0 });
                    tracing::info!(provider, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        provider.to_string(),
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(provider.to_string(), CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    /// Record a failed completion.
    pub fn record_failure(&self, provider: &str) {
        let mut states = self.states.write();
        let failures = match states.get(provider).cloned() {
            Some(CircuitState::Closed { failures }) => failures + 1,
            None => 1,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    provider.to_string(),
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(provider, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures >= self.config.failure_threshold {
            states.insert(
                provider.to_string(),
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(provider, failures, "Circuit opened after repeated failures");
        } else {
            states.insert(provider.to_string(), CircuitState::Closed { failures });
        }
    }

    fn transition_to_half_open(&self, provider: &str) {
        let mut states = self.states.write();
        if matches!(states.get(provider), Some(CircuitState::Open { .. })) {
            states.insert(provider.to_string(), CircuitState::HalfOpen { successes: 0 });
            tracing::info!(provider, "Circuit transitioning to half-open for recovery test");
        }
    }

    /// Get current state of a circuit.
    pub fn state(&self, provider: &str) -> CircuitState {
        self.states
            .read()
            .get(provider)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open("gemini"));
        assert_eq!(cb.state("gemini"), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_circuit_opens_after_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        cb.record_failure("gemini");
        assert!(!cb.is_open("gemini"));

        cb.record_failure("gemini");
        assert!(cb.is_open("gemini"));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::default();

        cb.record_failure("gemini");
        cb.record_failure("gemini");
        cb.record_success("gemini");

        cb.record_failure("gemini");
        cb.record_failure("gemini");
        assert!(!cb.is_open("gemini"));
    }

    #[test]
    fn test_providers_are_independent() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });

        cb.record_failure("gemini");
        assert!(cb.is_open("gemini"));
        assert!(!cb.is_open("mock"));
    }

    #[test]
    fn test_half_open_recovery() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 2,
        });

        cb.record_failure("gemini");
        // Zero timeout: the next check moves straight to half-open
        assert!(!cb.is_open("gemini"));
        assert_eq!(cb.state("gemini"), CircuitState::HalfOpen { successes: 0 });

        cb.record_success("gemini");
        assert_eq!(cb.state("gemini"), CircuitState::HalfOpen { successes: 1 });
        cb.record_success("gemini");
        assert_eq!(cb.state("gemini"), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 1,
        });

        cb.record_failure("gemini");
        assert!(!cb.is_open("gemini"));
        cb.record_failure("gemini");
        assert!(matches!(cb.state("gemini"), CircuitState::Open { .. }));

        cb.reset();
        assert_eq!(cb.state("gemini"), CircuitState::Closed { failures: 0 });
    }
}
