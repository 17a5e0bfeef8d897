//! Resource API access for the R-Series account
//!
//! All resource calls go through [`RateLimitedExecutor`], which owns
//! authentication headers, request spacing and retries.

pub mod executor;

pub use executor::RateLimitedExecutor;
