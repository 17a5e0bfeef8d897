//! # R-Series Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for request execution, auth and credential
//!   persistence
//! - Order mapping and response id extraction
//! - The order submission service
//!
//! ## Architecture Principles
//! - Only depends on `rseries-domain`
//! - No HTTP, file or clock-driven I/O
//! - All external dependencies via traits

pub mod connector_ports;
pub mod orders;

// Re-export specific items to avoid ambiguity
pub use connector_ports::{AuthHeaderProvider, CredentialStore, RequestExecutor};
pub use orders::ports::RecordSink;
pub use orders::{OrderMapper, OrderSubmissionService, SubmissionStage};
