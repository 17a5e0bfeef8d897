//! Runtime tunables with production defaults

use std::time::Duration;

use rseries_common::resilience::{BackoffStrategy, RetryConfig};
use rseries_domain::{ConnectorError, Result};
use rseries_domain::constants::{
    BACKOFF_FACTOR, BACKOFF_INITIAL_DELAY_SECS, DEFAULT_HTTP_TIMEOUT_SECS, MAX_AUTH_ATTEMPTS,
    MAX_REQUEST_ATTEMPTS, MAX_RETRY_TIME_SECS, MIN_REQUEST_INTERVAL_MS,
};

/// Timing knobs of one connector instance.
///
/// Defaults follow the provider's limits; tests shrink them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorSettings {
    /// Spacing between the end of one resource call and the start of the next
    pub min_request_interval: Duration,
    /// Retry budget of resource API calls
    pub request_retry: RetryConfig,
    /// Retry budget of the token refresh exchange
    pub auth_retry: RetryConfig,
    pub http_timeout: Duration,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_millis(MIN_REQUEST_INTERVAL_MS),
            request_retry: provider_retry(MAX_REQUEST_ATTEMPTS),
            auth_retry: provider_retry(MAX_AUTH_ATTEMPTS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ConnectorSettings {
    /// # Errors
    /// Returns a configuration error when either retry budget is unusable.
    pub fn validate(&self) -> Result<()> {
        for (name, retry) in [("request_retry", &self.request_retry), ("auth_retry", &self.auth_retry)] {
            retry
                .validate()
                .map_err(|err| ConnectorError::Config(format!("invalid {name}: {err}")))?;
        }
        Ok(())
    }
}

fn provider_retry(max_attempts: u32) -> RetryConfig {
    let max_total_time = Duration::from_secs(MAX_RETRY_TIME_SECS);
    RetryConfig {
        max_attempts,
        backoff: BackoffStrategy::Exponential {
            initial_delay: Duration::from_secs(BACKOFF_INITIAL_DELAY_SECS),
            factor: BACKOFF_FACTOR,
            max_delay: max_total_time,
        },
        max_total_time: Some(max_total_time),
    }
}
