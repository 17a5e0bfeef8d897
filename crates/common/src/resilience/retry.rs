//! Generic retry strategy with exponential backoff and a total-time cap
//!
//! The executor is generic over the error type. Whether an error is retried
//! is decided by a [`RetryPolicy`], so callers keep their classification
//! logic next to their error enum. A policy may also hand back a
//! provider-directed wait ([`RetryDecision::RetryAfter`]) which is honoured
//! before the regular backoff step.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted
    #[error("All retry attempts exhausted after {attempts} tries: {last:?}")]
    AttemptsExhausted { attempts: u32, last: E },

    /// The operation failed with a non-retryable error
    #[error("Operation failed with non-retryable error: {source:?}")]
    NonRetryable { source: E },

    /// The retry strategy configuration is invalid
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The total time budget ran out
    #[error("Retry timeout exceeded after {elapsed:?} ({attempts} attempts)")]
    TimeoutExceeded { elapsed: Duration, attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    /// The last error the operation produced, if any.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::AttemptsExhausted { last, .. } => Some(last),
            Self::NonRetryable { source } => Some(source),
            Self::TimeoutExceeded { last, .. } => last,
            Self::InvalidConfiguration { .. } => None,
        }
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Determine if the error should be retried and optionally provide a
    /// provider-directed wait
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the regular backoff delay
    Retry,
    /// Wait this long, then the regular backoff delay, then retry
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// `initial_delay * factor^attempt`, capped at `max_delay`
    Exponential { initial_delay: Duration, factor: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Calculate the delay following the given (0-based) failed attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, factor, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_secs_f64() * factor.powi(exponent);
                if delay.is_finite() && delay < max_delay.as_secs_f64() {
                    Duration::from_secs_f64(delay)
                } else {
                    *max_delay
                }
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first call included
    pub max_attempts: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
    /// Maximum total time to spend, waits included
    pub max_total_time: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_secs(1),
                factor: 2.0,
                max_delay: Duration::from_secs(60),
            },
            max_total_time: Some(Duration::from_secs(300)),
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryError<()>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        match &self.backoff {
            BackoffStrategy::Exponential { factor, .. } if *factor <= 0.0 => {
                return Err(RetryError::InvalidConfiguration {
                    message: "exponential factor must be greater than 0".to_string(),
                });
            }
            _ => {}
        }

        Ok(())
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        factor: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, factor, max_delay };
        self
    }

    pub fn max_total_time(mut self, duration: Duration) -> Self {
        self.config.max_total_time = Some(duration);
        self
    }

    pub fn unlimited_time(mut self) -> Self {
        self.config.max_total_time = None;
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryError<()>> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let attempt_number = attempt + 1;
            debug!("Executing operation (attempt {}/{})", attempt_number, self.config.max_attempts);

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let extra_wait = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!("Retry policy determined not to retry: {:?}", error);
                    return Err(RetryError::NonRetryable { source: error });
                }
                RetryDecision::Retry => Duration::ZERO,
                RetryDecision::RetryAfter(wait) => wait,
            };

            if attempt_number >= self.config.max_attempts {
                warn!(
                    "All retry attempts exhausted after {} tries, last error: {:?}",
                    attempt_number, error
                );
                return Err(RetryError::AttemptsExhausted { attempts: attempt_number, last: error });
            }

            let backoff = self.config.backoff.calculate_delay(attempt);
            let mut delay = extra_wait.saturating_add(backoff);
            if let Some(max_time) = self.config.max_total_time {
                let elapsed = start.elapsed();
                if elapsed >= max_time {
                    warn!(
                        "Retry timeout exceeded after {:?} (attempts: {})",
                        elapsed, attempt_number
                    );
                    return Err(RetryError::TimeoutExceeded {
                        elapsed,
                        attempts: attempt_number,
                        last: Some(error),
                    });
                }
                delay = delay.min(max_time - elapsed);
            }

            warn!(
                "Operation failed (attempt {}), retrying after {:?}: {:?}",
                attempt_number, delay, error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
