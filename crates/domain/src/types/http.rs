//! Transport-neutral request and response values
//!
//! Core services build [`ApiRequest`]s and interpret [`ApiResponse`]s without
//! depending on the HTTP client used by infra.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ConnectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against the account-scoped resource API.
///
/// `path` is relative to `{base_url}/API/V3/Account/{account_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
    /// Call-specific header overrides, applied last.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A delivered response. Any status except 429 ends up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into() }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    /// Returns the parser error when the body is not valid JSON.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }

    /// Body as JSON, or the raw text wrapped in a JSON string.
    #[must_use]
    pub fn body_value(&self) -> Value {
        self.json().unwrap_or_else(|_| Value::String(self.body.clone()))
    }

    /// Turn a non-2xx response into a [`ConnectorError::Delivery`].
    ///
    /// # Errors
    /// Returns `Delivery` carrying status and body for non-2xx responses.
    pub fn error_for_status(self) -> Result<Self, ConnectorError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ConnectorError::Delivery { status: self.status, body: self.body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_body_and_headers() {
        let req = ApiRequest::post("/Order.json", serde_json::json!({"shopID": "1"}))
            .with_header("X-Trace", "abc");

        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.query.is_empty());
        assert_eq!(req.headers.get("X-Trace").map(String::as_str), Some("abc"));
        assert!(req.body.is_some());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let ok = ApiResponse::new(201, "{}");
        assert!(ok.clone().error_for_status().is_ok());

        let err = ApiResponse::new(400, "bad shop").error_for_status().unwrap_err();
        assert_eq!(err, ConnectorError::Delivery { status: 400, body: "bad shop".into() });
    }

    #[test]
    fn body_value_falls_back_to_text() {
        assert_eq!(ApiResponse::new(200, r#"{"a":1}"#).body_value(), serde_json::json!({"a": 1}));
        assert_eq!(ApiResponse::new(500, "oops").body_value(), Value::String("oops".into()));
    }
}
