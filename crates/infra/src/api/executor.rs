//! Rate-limited request executor for the account-scoped resource API
//!
//! Every outbound resource call goes through [`RateLimitedExecutor`]:
//!
//! 1. Wait for the shared [`MinIntervalGate`]
//! 2. Merge static, auth and call-specific headers (in that order)
//! 3. Send once and record the completion time, success or failure
//! 4. Classify: 429 becomes `Overload`, network failures `Transient`, every
//!    other status is handed back to the caller
//!
//! Steps 1-4 form one attempt; the whole attempt is wrapped in the retry
//! executor so overload and transient failures are retried with backoff.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::Method;
use rseries_common::resilience::{MinIntervalGate, RetryConfig, RetryExecutor};
use rseries_core::{AuthHeaderProvider, RequestExecutor};
use rseries_domain::constants::{ERROR_BODY_PREVIEW_CHARS, ERROR_LOG_PREVIEW_CHARS};
use rseries_domain::{ApiRequest, ApiResponse, ConnectorError, HttpMethod, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::flatten_retry_error;
use crate::http::{parse_retry_after, HttpClient, ProviderRetryPolicy};

/// The single chokepoint for resource API calls of one connector instance.
pub struct RateLimitedExecutor {
    http: HttpClient,
    gate: Arc<MinIntervalGate>,
    auth: Arc<dyn AuthHeaderProvider>,
    account_url: String,
    static_headers: BTreeMap<String, String>,
    retry: RetryExecutor<ProviderRetryPolicy>,
}

impl RateLimitedExecutor {
    /// # Arguments
    /// * `account_url` - `{base_url}/API/V3/Account/{account_id}`
    /// * `gate` - shared with anything else calling the same account
    /// * `retry` - budget for overload and transient failures
    pub fn new(
        http: HttpClient,
        account_url: impl Into<String>,
        gate: Arc<MinIntervalGate>,
        auth: Arc<dyn AuthHeaderProvider>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            http,
            gate,
            auth,
            account_url: account_url.into().trim_end_matches('/').to_string(),
            static_headers: BTreeMap::new(),
            retry: RetryExecutor::new(retry, ProviderRetryPolicy::requests()),
        }
    }

    /// Add a header sent with every call, before auth headers.
    #[must_use]
    pub fn with_static_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_headers.insert(name.into(), value.into());
        self
    }

    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.account_url)
        } else {
            format!("{}/{path}", self.account_url)
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let _permit = self.gate.acquire().await;

        let mut headers = self.static_headers.clone();
        headers.extend(self.auth.auth_headers().await?);
        headers.extend(request.headers.clone());

        let url = self.url_for(&request.path);
        let mut builder = self.http.request(to_method(request.method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        info!(
            endpoint = %request.path,
            method = %request.method,
            url = %url,
            payload = ?request.body,
            params = ?request.query,
            "Making request"
        );

        let response = self.http.send(builder).await?;
        let status = response.status().as_u16();
        let response_headers = collect_headers(response.headers());
        let body = self.http.read_text(response).await?;

        if status == 429 {
            let raw = response_headers.get("retry-after").map(String::as_str);
            let wait = parse_retry_after(raw, Utc::now());
            warn!(
                endpoint = %request.path,
                wait_secs = wait.as_secs(),
                retry_after = raw.unwrap_or("-"),
                "Rate limited (429)"
            );
            return Err(ConnectorError::Overload { retry_after: wait, body });
        }

        let response = ApiResponse { status, headers: response_headers, body };
        log_response(&request.path, &response);
        Ok(response)
    }
}

#[async_trait]
impl RequestExecutor for RateLimitedExecutor {
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.retry.execute(|| self.attempt(&request)).await.map_err(flatten_retry_error)
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn log_response(endpoint: &str, response: &ApiResponse) {
    if response.is_success() {
        debug!(
            endpoint,
            status = response.status,
            preview = %preview(&response.body, ERROR_BODY_PREVIEW_CHARS),
            "Request succeeded"
        );
        return;
    }

    let detail = match response.json() {
        Ok(value) => value.to_string(),
        Err(_) => preview(&response.body, ERROR_LOG_PREVIEW_CHARS),
    };
    error!(
        endpoint,
        status = response.status,
        error_response = %detail,
        headers = ?response.headers,
        "Request returned an error status"
    );
}

fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
