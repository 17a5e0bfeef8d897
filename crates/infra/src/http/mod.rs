//! HTTP plumbing shared by the token manager and the request executor

pub mod client;
pub mod policy;
pub mod retry_after;

#[cfg(test)]
pub(crate) mod stalling_server;

pub use client::{HttpClient, HttpClientBuilder};
pub use policy::ProviderRetryPolicy;
pub use retry_after::parse_retry_after;
