//! Shared fixtures for the infra integration suites.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use rseries_common::resilience::RetryConfig;
use rseries_infra::config::{self, ConnectorSettings, LoadedConfig};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use wiremock::MockServer;

pub const ACCOUNT_PATH: &str = "/API/V3/Account/42";

/// Config file on disk pointing both endpoints at `server`.
pub struct TestConfig {
    pub loaded: LoadedConfig,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestConfig {
    pub fn write(server: &MockServer, overrides: Value) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.json");

        let mut contents = json!({
            "refresh_token": "refresh-1",
            "client_id": "client",
            "client_secret": "secret",
            "account_ids": 42,
            "buyorders_shop_id": "1",
            "full_url": server.uri(),
            "auth_endpoint": format!("{}/auth/oauth/token", server.uri()),
            "user_agent": "rseries-tests",
            "tenant": "keep-me"
        });
        if let (Some(base), Value::Object(extra)) = (contents.as_object_mut(), overrides) {
            base.extend(extra);
        }
        std::fs::write(&path, contents.to_string()).expect("write config");

        let loaded = config::load(Some(path.clone())).expect("config loads");
        Self { loaded, path, _dir: dir }
    }

    pub fn on_disk(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(&self.path).expect("read config"))
            .expect("config is JSON")
    }
}

/// Production shape with millisecond timings.
pub fn fast_settings() -> ConnectorSettings {
    let retry = |attempts| {
        RetryConfig::builder()
            .max_attempts(attempts)
            .fixed_backoff(Duration::from_millis(1))
            .max_total_time(Duration::from_secs(5))
            .build()
            .expect("retry config")
    };
    ConnectorSettings {
        min_request_interval: Duration::from_millis(5),
        request_retry: retry(5),
        auth_retry: retry(10),
        http_timeout: Duration::from_secs(5),
    }
}

pub fn record(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("record is an object")
}
