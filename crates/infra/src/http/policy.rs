//! Retry policies for provider calls

use rseries_common::resilience::{RetryDecision, RetryPolicy};
use rseries_domain::{ConnectorError, ErrorCategory};

/// Decides retries from the error category.
///
/// Overload waits for the provider's `Retry-After` before the backoff step.
/// Transient failures are retried only when `retry_transient` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderRetryPolicy {
    retry_transient: bool,
}

impl ProviderRetryPolicy {
    /// Resource API calls: overload and transient failures.
    pub const fn requests() -> Self {
        Self { retry_transient: true }
    }

    /// Token refresh: overload only.
    pub const fn token_refresh() -> Self {
        Self { retry_transient: false }
    }
}

impl RetryPolicy<ConnectorError> for ProviderRetryPolicy {
    fn should_retry(&self, error: &ConnectorError, _attempt: u32) -> RetryDecision {
        match error.category() {
            ErrorCategory::Overload => {
                error.retry_after().map_or(RetryDecision::Retry, RetryDecision::RetryAfter)
            }
            ErrorCategory::Transient if self.retry_transient => RetryDecision::Retry,
            _ => RetryDecision::Stop,
        }
    }
}
