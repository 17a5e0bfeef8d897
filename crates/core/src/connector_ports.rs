//! Port interfaces between the order workflow and the provider plumbing

use std::collections::BTreeMap;

use async_trait::async_trait;
use rseries_domain::{ApiRequest, ApiResponse, Credentials, Result};

/// Single chokepoint for every call against the resource API.
///
/// Implementations apply auth headers, rate limiting and retries. Any status
/// other than 429 is returned as an [`ApiResponse`] for the caller to
/// interpret.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Source of `Authorization` headers, refreshing the token when needed.
#[async_trait]
pub trait AuthHeaderProvider: Send + Sync {
    async fn auth_headers(&self) -> Result<BTreeMap<String, String>>;
}

/// Persistence for the connector's credential record
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credentials
    async fn load(&self) -> Result<Credentials>;

    /// Overwrite the stored credentials
    async fn save(&self, credentials: &Credentials) -> Result<()>;
}
