//! Resilience patterns for the chat assistant.
//!
//! - Circuit breaker so a failing provider is not hammered
//! - Retry with exponential backoff for transient provider errors

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::RetryPolicy;
