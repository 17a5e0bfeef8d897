//! Connector wiring for one R-Series account
//!
//! Builds the token manager, the shared request gate, the rate-limited
//! executor and the sinks from a loaded configuration, then routes records
//! to the sink of their stream.

use std::sync::Arc;

use rseries_common::resilience::MinIntervalGate;
use rseries_core::{
    AuthHeaderProvider, CredentialStore, OrderMapper, OrderSubmissionService, RecordSink,
    RequestExecutor,
};
use rseries_domain::constants::BUY_ORDERS_STREAM;
use rseries_domain::{ConnectorConfig, Record, Result, SinkContext, SubmissionOutcome};
use tracing::{info, instrument};

use super::sinks::{BuyOrdersSink, FallbackSink};
use crate::api::RateLimitedExecutor;
use crate::auth::{JsonFileCredentialStore, TokenManager};
use crate::config::{ConnectorSettings, LoadedConfig};
use crate::http::HttpClient;

/// One connector instance: one account, one credential record, one gate.
pub struct RSeriesConnector {
    token_manager: Arc<TokenManager>,
    executor: Arc<RateLimitedExecutor>,
    buy_orders: BuyOrdersSink,
    fallback: FallbackSink,
}

impl RSeriesConnector {
    /// Wire a connector whose refreshed credentials are written back to the
    /// config file they were loaded from.
    ///
    /// # Errors
    /// Fails when the settings are invalid or the HTTP client cannot be built.
    pub fn from_loaded(loaded: &LoadedConfig, settings: &ConnectorSettings) -> Result<Self> {
        let store = Arc::new(JsonFileCredentialStore::new(&loaded.path));
        Self::new(&loaded.config, store, settings)
    }

    /// Wire a connector around an arbitrary credential store.
    ///
    /// # Errors
    /// See [`RSeriesConnector::from_loaded`].
    pub fn new(
        config: &ConnectorConfig,
        store: Arc<dyn CredentialStore>,
        settings: &ConnectorSettings,
    ) -> Result<Self> {
        settings.validate()?;

        let http = HttpClient::builder().timeout(settings.http_timeout).build()?;

        let token_manager = Arc::new(TokenManager::new(
            http.clone(),
            config.auth_endpoint(),
            config.credentials(),
            store,
            settings.auth_retry.clone(),
        ));

        let gate = Arc::new(MinIntervalGate::with_interval(settings.min_request_interval));
        let auth: Arc<dyn AuthHeaderProvider> = token_manager.clone();
        let mut executor = RateLimitedExecutor::new(
            http,
            config.account_url(),
            gate,
            auth,
            settings.request_retry.clone(),
        );
        if let Some(agent) = config.user_agent.as_deref().filter(|a| !a.is_empty()) {
            executor = executor.with_static_header("User-Agent", agent);
        }
        let executor = Arc::new(executor);

        let mapper = OrderMapper::new(config.default_shop_id().map(str::to_owned));
        let requests: Arc<dyn RequestExecutor> = executor.clone();
        let service = OrderSubmissionService::new(requests, mapper);

        info!(
            account_url = executor.account_url(),
            auth_endpoint = config.auth_endpoint(),
            "R-Series connector ready"
        );

        Ok(Self {
            token_manager,
            executor,
            buy_orders: BuyOrdersSink::new(service),
            fallback: FallbackSink,
        })
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    pub fn executor(&self) -> &Arc<RateLimitedExecutor> {
        &self.executor
    }

    /// Preprocess and submit one record of `stream`.
    #[instrument(skip(self, record))]
    pub async fn process_record(&self, stream: &str, record: &Record) -> SubmissionOutcome {
        let context = SinkContext::new(stream);
        match stream {
            BUY_ORDERS_STREAM => self.buy_orders.process_record(record, &context).await,
            _ => self.fallback.process_record(record, &context).await,
        }
    }
}
