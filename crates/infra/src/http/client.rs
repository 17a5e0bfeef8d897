use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use rseries_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use rseries_domain::ConnectorError;
use tracing::debug;

use crate::errors::InfraError;

/// Thin reqwest wrapper with a per-request timeout.
///
/// Sends exactly once; retries and rate limiting are layered on top by the
/// callers, which know how the provider signals overload.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ConnectorError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Read the full response body.
    ///
    /// A timeout or dropped connection mid-body is a transient failure, not
    /// an empty body.
    pub async fn read_text(&self, response: Response) -> Result<String, ConnectorError> {
        response.text().await.map_err(|err| {
            debug!(error = %err, "failed to read HTTP response body");
            ConnectorError::Transient(format!("HTTP response body failed: {err}"))
        })
    }

    /// Execute the provided request builder once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ConnectorError> {
        let request = builder.build().map_err(|err| ConnectorError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient, ConnectorError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .no_proxy()
            .build()
            .map_err(|err| ConnectorError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}
