//! # R-Series Domain
//!
//! Business domain types for the R-Series purchase-order connector.
//!
//! This crate contains:
//! - Connector configuration and OAuth credentials
//! - Order and order-line payloads, submission outcomes
//! - Transport-neutral HTTP request/response value types
//! - The connector error taxonomy and Result alias
//! - Provider constants (buffers, rate ceilings, retry bounds)
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
