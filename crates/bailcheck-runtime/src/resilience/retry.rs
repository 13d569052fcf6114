//! Retry with exponential backoff for transient provider failures.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::providers::ProviderError;

/// Exponential backoff applied to rate-limit and timeout failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
    }

    /// Run `operation`, retrying while it fails with a transient error.
    ///
    /// A `retry_after` hint from the provider is not honoured beyond the
    /// configured `max_delay`.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        operation
            .retry(self.backoff())
            .when(ProviderError::is_transient)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(error = %err, ?delay, "Provider call failed, retrying");
            })
            .await
    }
}
