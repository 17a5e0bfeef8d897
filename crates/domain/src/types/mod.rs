//! Domain types and models

pub mod credentials;
pub mod http;
pub mod orders;
pub mod outcome;

pub use credentials::Credentials;
pub use http::{ApiRequest, ApiResponse, HttpMethod};
pub use orders::{LinePayload, OrderPayload, Record};
pub use outcome::{SinkContext, SubmissionOutcome};
