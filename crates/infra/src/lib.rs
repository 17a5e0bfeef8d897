//! # R-Series Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - HTTP client, `Retry-After` parsing and provider retry policies
//! - OAuth token lifecycle and credential persistence
//! - The rate-limited resource API executor
//! - Config file loading and logging setup
//! - The R-Series connector wiring and its sinks
//!
//! ## Architecture
//! - Implements traits defined in `rseries-core`
//! - Depends on `rseries-common` for retries and request spacing
//! - Contains all "impure" code (network, files, clock)

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use api::RateLimitedExecutor;
pub use auth::{JsonFileCredentialStore, MemoryCredentialStore, RefreshOutcome, TokenManager};
pub use config::{ConnectorSettings, LoadedConfig};
pub use errors::{flatten_retry_error, InfraError};
pub use http::{HttpClient, ProviderRetryPolicy};
pub use integrations::RSeriesConnector;
pub use observability::{init_tracing, LogFormat};
