//! Infrastructure error plumbing

pub mod conversions;

pub use conversions::{flatten_retry_error, InfraError};
