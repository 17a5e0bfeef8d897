//! Token manager with on-demand refresh
//!
//! Manages the OAuth token lifecycle:
//! - Decides whether the cached access token is still usable
//! - Exchanges the refresh token for a new access token when it is not
//! - Persists refreshed credentials before handing the token out
//!
//! The credential record is guarded by an async mutex held across the
//! refresh, so concurrent callers never run two exchanges at once.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use rseries_common::resilience::{RetryConfig, RetryExecutor};
use rseries_core::{AuthHeaderProvider, CredentialStore};
use rseries_domain::constants::{
    DEFAULT_TOKEN_EXPIRATION_SECS, ERROR_BODY_PREVIEW_CHARS, TOKEN_NOT_EXPIRED_SIGNAL,
};
use rseries_domain::{ConnectorError, Credentials, Result};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::flatten_retry_error;
use crate::http::{parse_retry_after, HttpClient, ProviderRetryPolicy};

/// Result of one refresh exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New credentials were stored and persisted.
    Refreshed,
    /// Provider says the current token is still good; nothing changed.
    NotExpired,
}

#[derive(Debug)]
struct TokenResponse {
    status: u16,
    body: String,
}

/// Owns the credential record of one connector instance.
pub struct TokenManager {
    http: HttpClient,
    auth_endpoint: String,
    credentials: Mutex<Credentials>,
    store: Arc<dyn CredentialStore>,
    retry: RetryExecutor<ProviderRetryPolicy>,
    state: Mutex<Map<String, Value>>,
}

impl TokenManager {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `http` - client used for the token endpoint
    /// * `auth_endpoint` - OAuth token URL
    /// * `credentials` - record loaded at startup
    /// * `store` - where refreshed credentials are persisted
    /// * `retry` - budget for 429 answers from the token endpoint
    pub fn new(
        http: HttpClient,
        auth_endpoint: impl Into<String>,
        credentials: Credentials,
        store: Arc<dyn CredentialStore>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            http,
            auth_endpoint: auth_endpoint.into(),
            credentials: Mutex::new(credentials),
            store,
            retry: RetryExecutor::new(retry, ProviderRetryPolicy::token_refresh()),
            state: Mutex::new(Map::new()),
        }
    }

    /// Snapshot of the current credential record.
    pub async fn credentials(&self) -> Credentials {
        self.credentials.lock().await.clone()
    }

    /// Diagnostic state, e.g. `auth_error_response` after a rejected refresh.
    pub async fn auth_state(&self) -> Map<String, Value> {
        self.state.lock().await.clone()
    }

    /// Current bearer token, refreshing first when it is missing or about
    /// to expire.
    ///
    /// # Errors
    /// Propagates refresh failures; fails with a configuration error when no
    /// token is available even after refreshing.
    pub async fn access_token(&self) -> Result<String> {
        let mut credentials = self.credentials.lock().await;

        if !credentials.is_valid() {
            debug!("Access token missing or expiring, refreshing");
            self.refresh_locked(&mut credentials).await?;
        }

        credentials
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConnectorError::Config("no access token available".into()))
    }

    /// Run the refresh exchange unconditionally.
    ///
    /// # Errors
    /// See [`TokenManager::access_token`].
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let mut credentials = self.credentials.lock().await;
        self.refresh_locked(&mut credentials).await
    }

    #[instrument(skip_all, fields(endpoint = %self.auth_endpoint))]
    async fn refresh_locked(&self, credentials: &mut Credentials) -> Result<RefreshOutcome> {
        let refresh_token = credentials.refresh_token().map(str::to_owned).ok_or_else(|| {
            ConnectorError::Config(
                "No refresh_token found in config. Cannot refresh access token.".into(),
            )
        })?;

        info!(refresh_token = %redact(&refresh_token), "Requesting new token from OAuth endpoint");
        let request_start = Utc::now().timestamp();

        let form = [
            ("refresh_token", refresh_token.clone()),
            ("grant_type", "refresh_token".to_string()),
            ("client_id", credentials.client_id.clone()),
            ("client_secret", credentials.client_secret.clone()),
        ];

        let response = self
            .retry
            .execute(|| self.request_token(&form))
            .await
            .map_err(flatten_retry_error)?;

        let parsed: Option<Value> = serde_json::from_str(&response.body).ok();

        if response.status == 200
            && parsed
                .as_ref()
                .and_then(|body| body.get("error_description"))
                .and_then(Value::as_str)
                == Some(TOKEN_NOT_EXPIRED_SIGNAL)
        {
            warn!(signal = TOKEN_NOT_EXPIRED_SIGNAL, "Refresh skipped, access token not expired");
            return Ok(RefreshOutcome::NotExpired);
        }

        if !(200..300).contains(&response.status) {
            let error_body = parsed.unwrap_or_else(|| unparsed_error(&response.body));
            error!(
                refresh_token = %redact(&refresh_token),
                status = response.status,
                error_response = %error_body,
                "Token refresh failed"
            );
            self.state.lock().await.insert("auth_error_response".into(), error_body.clone());
            return Err(ConnectorError::Auth { status: response.status, body: error_body });
        }

        let body = parsed.unwrap_or_else(|| unparsed_error(&response.body));
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConnectorError::Auth {
                status: response.status,
                body: json!({"error": "access_token missing from token response"}),
            })?
            .to_string();
        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(DEFAULT_TOKEN_EXPIRATION_SECS);
        let new_refresh_token = body
            .get("refresh_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);

        let refresh_token_state = if new_refresh_token.is_some() { "updated" } else { "unchanged" };
        let mut updated = credentials.clone();
        updated.access_token = Some(access_token);
        if let Some(token) = new_refresh_token {
            updated.refresh_token = Some(token);
        } else {
            debug!("No refresh_token in response, keeping existing one");
        }
        let expires_at = request_start.saturating_add(expires_in);
        updated.expires_at = Some(expires_at);

        *credentials = updated;
        self.store.save(credentials).await?;

        info!(
            expires_in,
            expires_at,
            refresh_token = refresh_token_state,
            "Tokens refreshed and saved"
        );
        Ok(RefreshOutcome::Refreshed)
    }

    async fn request_token(&self, form: &[(&str, String)]) -> Result<TokenResponse> {
        let builder = self.http.request(Method::POST, &self.auth_endpoint).form(form);
        let response = self.http.send(builder).await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = self.http.read_text(response).await?;

        if status == 429 {
            let wait = parse_retry_after(retry_after.as_deref(), Utc::now());
            warn!(
                wait_secs = wait.as_secs(),
                retry_after = retry_after.as_deref().unwrap_or("-"),
                "Token endpoint rate limited (429)"
            );
            return Err(ConnectorError::Overload { retry_after: wait, body });
        }

        Ok(TokenResponse { status, body })
    }
}

#[async_trait]
impl AuthHeaderProvider for TokenManager {
    async fn auth_headers(&self) -> Result<BTreeMap<String, String>> {
        let token = self.access_token().await?;
        Ok(BTreeMap::from([("Authorization".to_string(), format!("Bearer {token}"))]))
    }
}

fn unparsed_error(text: &str) -> Value {
    json!({
        "error": "Could not parse error response",
        "text": text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect::<String>(),
    })
}

/// Short prefix of a secret, safe for logs.
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use rseries_domain::ErrorCategory;

    use crate::auth::MemoryCredentialStore;
    use crate::http::stalling_server::StallingServer;

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig::builder()
            .max_attempts(max_attempts)
            .fixed_backoff(Duration::from_millis(1))
            .max_total_time(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn stale_credentials() -> Credentials {
        Credentials {
            access_token: Some("old-access".into()),
            refresh_token: Some("refresh-1".into()),
            client_id: "client".into(),
            client_secret: "secret".into(),
            expires_at: Some(Utc::now().timestamp() + 30),
        }
    }

    fn manager(
        server: &MockServer,
        credentials: Credentials,
        store: Arc<MemoryCredentialStore>,
    ) -> TokenManager {
        TokenManager::new(
            HttpClient::new().unwrap(),
            format!("{}/oauth/token", server.uri()),
            credentials,
            store,
            fast_retry(3),
        )
    }

    #[tokio::test]
    async fn valid_token_is_returned_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut creds = stale_credentials();
        creds.expires_at = Some(Utc::now().timestamp() + 3600);
        let mgr = manager(&server, creds, Arc::new(MemoryCredentialStore::default()));

        let headers = mgr.auth_headers().await.unwrap();
        assert_eq!(headers["Authorization"], "Bearer old-access");
    }

    #[tokio::test]
    async fn stale_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .and(body_string_contains("client_id=client"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "expires_in": 1800
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::default());
        let mgr = manager(&server, stale_credentials(), Arc::clone(&store));
        let before = Utc::now().timestamp();

        let headers = mgr.auth_headers().await.unwrap();

        assert_eq!(headers["Authorization"], "Bearer new-access");
        let creds = mgr.credentials().await;
        assert_eq!(creds.refresh_token.as_deref(), Some("refresh-1"));
        let expires_at = creds.expires_at.unwrap();
        assert!(expires_at >= before + 1800 && expires_at <= Utc::now().timestamp() + 1800);
        assert_eq!(store.save_count().await, 1);
        assert_eq!(store.load().await.unwrap(), creds);
    }

    #[tokio::test]
    async fn missing_refresh_token_is_a_config_error() {
        let server = MockServer::start().await;
        let mut creds = stale_credentials();
        creds.refresh_token = None;
        let mgr = manager(&server, creds, Arc::new(MemoryCredentialStore::default()));

        let err = mgr.refresh().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Config(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_expired_signal_leaves_credentials_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error_description": TOKEN_NOT_EXPIRED_SIGNAL
            })))
            .expect(2)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::default());
        let creds = stale_credentials();
        let mgr = manager(&server, creds.clone(), Arc::clone(&store));

        assert_eq!(mgr.refresh().await.unwrap(), RefreshOutcome::NotExpired);
        assert_eq!(mgr.refresh().await.unwrap(), RefreshOutcome::NotExpired);
        assert_eq!(mgr.credentials().await, creds);
        assert_eq!(store.save_count().await, 0);
    }

    #[tokio::test]
    async fn rejection_records_parsed_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let mgr = manager(&server, stale_credentials(), Arc::new(MemoryCredentialStore::default()));
        let err = mgr.refresh().await.unwrap_err();

        assert_eq!(err, ConnectorError::Auth { status: 400, body: json!({"error": "invalid_grant"}) });
        assert!(!err.is_retryable());
        assert_eq!(mgr.auth_state().await["auth_error_response"], json!({"error": "invalid_grant"}));
    }

    #[tokio::test]
    async fn unparseable_rejection_keeps_text_preview() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("x".repeat(500)))
            .mount(&server)
            .await;

        let mgr = manager(&server, stale_credentials(), Arc::new(MemoryCredentialStore::default()));
        let err = mgr.refresh().await.unwrap_err();

        let state = mgr.auth_state().await;
        let recorded = &state["auth_error_response"];
        assert_eq!(recorded["error"], json!("Could not parse error response"));
        assert_eq!(recorded["text"].as_str().unwrap().len(), 200);
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn rate_limited_refresh_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "after-429",
                "refresh_token": "refresh-2"
            })))
            .mount(&server)
            .await;

        let mgr = manager(&server, stale_credentials(), Arc::new(MemoryCredentialStore::default()));

        assert_eq!(mgr.access_token().await.unwrap(), "after-429");
        let creds = mgr.credentials().await;
        assert_eq!(creds.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn persistent_rate_limit_exhausts_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .expect(3)
            .mount(&server)
            .await;

        let mgr = manager(&server, stale_credentials(), Arc::new(MemoryCredentialStore::default()));
        let err = mgr.refresh().await.unwrap_err();

        assert!(matches!(err, ConnectorError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(err.status(), Some(429));
    }

    #[tokio::test]
    async fn stalled_token_body_fails_without_touching_credentials() {
        let server = StallingServer::start(1, r#"{"access_token": "late"}"#).await;
        let mgr = TokenManager::new(
            HttpClient::builder().timeout(Duration::from_millis(300)).build().unwrap(),
            format!("{}/oauth/token", server.uri()),
            stale_credentials(),
            Arc::new(MemoryCredentialStore::default()),
            fast_retry(3),
        );

        let err = mgr.refresh().await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Transient);
        assert_eq!(mgr.credentials().await.access_token.as_deref(), Some("old-access"));
    }

    #[tokio::test]
    async fn huge_expires_in_saturates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "forever",
                "expires_in": i64::MAX
            })))
            .mount(&server)
            .await;

        let mgr = manager(&server, stale_credentials(), Arc::new(MemoryCredentialStore::default()));
        mgr.refresh().await.unwrap();

        let creds = mgr.credentials().await;
        assert_eq!(creds.expires_at, Some(i64::MAX));
        assert!(creds.is_valid());
    }

    #[test]
    fn redacts_secrets() {
        assert_eq!(redact("abcdefgh"), "abcd***");
        assert_eq!(redact("ab"), "ab***");
    }
}
