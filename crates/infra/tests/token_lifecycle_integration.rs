//! Token refresh through the connector, persisted to the config file.

mod support;

use std::sync::Arc;

use chrono::Utc;
use rseries_core::RequestExecutor;
use rseries_domain::{ApiRequest, ConnectorError, HttpMethod};
use rseries_infra::RSeriesConnector;
use serde_json::json;
use support::{fast_settings, TestConfig, ACCOUNT_PATH};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn refreshed_tokens_are_written_back_to_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "refresh_token": "refresh-2",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ACCOUNT_PATH}/Vendor.json")))
        .and(header("Authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Vendor": []})))
        .expect(2)
        .mount(&server)
        .await;

    let cfg = TestConfig::write(&server, json!({"access_token": "stale", "expires_in": 0}));
    let connector = RSeriesConnector::from_loaded(&cfg.loaded, &fast_settings()).unwrap();
    let before = Utc::now().timestamp();

    let executor = Arc::clone(connector.executor());
    executor.execute(ApiRequest::new(HttpMethod::Get, "/Vendor.json")).await.unwrap();
    executor.execute(ApiRequest::new(HttpMethod::Get, "/Vendor.json")).await.unwrap();

    let on_disk = cfg.on_disk();
    assert_eq!(on_disk["access_token"], json!("access-2"));
    assert_eq!(on_disk["refresh_token"], json!("refresh-2"));
    let expires = on_disk["expires_in"].as_i64().unwrap();
    assert!(expires >= before + 1800 && expires <= Utc::now().timestamp() + 1800);
    assert_eq!(on_disk["tenant"], json!("keep-me"));

    let raw = std::fs::read_to_string(&cfg.path).unwrap();
    assert!(raw.contains("\n    \""), "config is written with four-space indent");
}

#[tokio::test]
async fn valid_token_from_config_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/oauth/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer still-good"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let expires = Utc::now().timestamp() + 3600;
    let cfg = TestConfig::write(&server, json!({"access_token": "still-good", "expires_in": expires}));
    let connector = RSeriesConnector::from_loaded(&cfg.loaded, &fast_settings()).unwrap();

    let response = connector
        .executor()
        .execute(ApiRequest::new(HttpMethod::Get, "/Vendor.json"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(cfg.on_disk()["access_token"], json!("still-good"));
}

#[tokio::test]
async fn rejected_refresh_fails_the_call_and_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = TestConfig::write(&server, json!({}));
    let connector = RSeriesConnector::from_loaded(&cfg.loaded, &fast_settings()).unwrap();

    let err = connector
        .executor()
        .execute(ApiRequest::new(HttpMethod::Get, "/Vendor.json"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::Auth { status: 401, .. }));
    let state = connector.token_manager().auth_state().await;
    assert_eq!(
        state["auth_error_response"],
        json!({"error": "Could not parse error response", "text": "unauthorized"})
    );
    assert!(cfg.on_disk().get("access_token").is_none());
}
