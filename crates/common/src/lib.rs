//! Shared runtime utilities for the R-Series connector crates.
//!
//! # Feature Tiers
//!
//! - `runtime`: async resilience primitives (retry executor, request gate)
//!
//! Nothing here knows about the provider or the connector's error taxonomy;
//! callers plug their classification in through
//! [`resilience::RetryPolicy`].

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{
    BackoffStrategy, GateConfig, GatePermit, MinIntervalGate, RetryConfig, RetryConfigBuilder,
    RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult,
};
