//! Resilience patterns for talking to rate-limited providers
//!
//! - **Retry**: exponential backoff with an attempt budget, a total-time cap
//!   and provider-directed waits
//! - **Rate limiting**: a serializing gate enforcing a minimum interval
//!   between consecutive requests
//!
//! Both are generic and carry no knowledge of the connector's error types;
//! classification lives in the [`RetryPolicy`] implementations of the
//! calling crates.

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{GateConfig, GatePermit, MinIntervalGate};
pub use retry::{
    BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryPolicy, RetryResult,
};
