//! Connector configuration

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::{ACCOUNT_PATH_PREFIX, DEFAULT_AUTH_ENDPOINT, DEFAULT_BASE_URL};
use crate::errors::{ConnectorError, Result};
use crate::types::Credentials;

/// Connector configuration as stored in the JSON config file.
///
/// `expires_in` keeps the file's historical naming: it holds the absolute
/// Unix expiry of `access_token`, not a duration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string_required")]
    pub account_ids: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub buyorders_shop_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_endpoint: Option<String>,
}

impl ConnectorConfig {
    /// Check the keys every run needs.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Config`] naming the first missing key.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("refresh_token", self.refresh_token.as_deref().unwrap_or_default()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("account_ids", self.account_ids.as_str()),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConnectorError::Config(format!("missing required config key: {key}")));
            }
        }
        Ok(())
    }

    /// Credential record seeded from the config.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token.clone().filter(|t| !t.is_empty()),
            refresh_token: self.refresh_token.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            expires_at: self.expires_in,
        }
    }

    /// Resource API host, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.full_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// `{base_url}/API/V3/Account/{account_ids}`
    #[must_use]
    pub fn account_url(&self) -> String {
        format!("{}{ACCOUNT_PATH_PREFIX}/{}", self.base_url(), self.account_ids)
    }

    #[must_use]
    pub fn auth_endpoint(&self) -> &str {
        self.auth_endpoint.as_deref().filter(|u| !u.trim().is_empty()).unwrap_or(DEFAULT_AUTH_ENDPOINT)
    }

    #[must_use]
    pub fn default_shop_id(&self) -> Option<&str> {
        self.buyorders_shop_id.as_deref().filter(|s| !s.is_empty())
    }
}

// Config files written by hand mix strings and numbers for ids and expiry.

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_string))
}

fn lenient_string_required<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    })
}
