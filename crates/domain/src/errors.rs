//! Error taxonomy shared by every connector layer

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Coarse error classification.
///
/// Retry eligibility is decided from the category, never from the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing credential, missing required field or bad settings. Fatal.
    Configuration,
    /// HTTP 429 from the token endpoint or the resource API.
    Overload,
    /// Timeouts and connection failures.
    Transient,
    /// Non-2xx response, rejected refresh, or an exhausted retry budget.
    Delivery,
}

/// Main error type for the connector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited (HTTP 429), retry after {}s", retry_after.as_secs())]
    Overload { retry_after: Duration, body: String },

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Delivery failed with HTTP {status}: {body}")]
    Delivery { status: u16, body: String },

    #[error("Authentication failed with HTTP {status}: {body}")]
    Auth { status: u16, body: Value },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ConnectorError> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Category used by retry policies and diagnostics.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Persistence(_) | Self::Internal(_) => {
                ErrorCategory::Configuration
            }
            Self::Overload { .. } => ErrorCategory::Overload,
            Self::Transient(_) => ErrorCategory::Transient,
            Self::Delivery { .. } | Self::Auth { .. } | Self::RetriesExhausted { .. } => {
                ErrorCategory::Delivery
            }
        }
    }

    /// Overload and transient failures are retried; everything else is not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Overload | ErrorCategory::Transient)
    }

    /// Provider-directed wait, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Overload { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// HTTP status attached to the failure, looking through retry exhaustion.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Overload { .. } => Some(429),
            Self::Delivery { status, .. } | Self::Auth { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Provider body attached to the failure, parsed as JSON when possible.
    #[must_use]
    pub fn response_body(&self) -> Option<Value> {
        match self {
            Self::Overload { body, .. } | Self::Delivery { body, .. } => Some(
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone())),
            ),
            Self::Auth { body, .. } => Some(body.clone()),
            Self::RetriesExhausted { last, .. } => last.response_body(),
            _ => None,
        }
    }

    /// Short variant name recorded as `error_type` in diagnostics.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Validation(_) => "ValidationError",
            Self::Overload { .. } => "RateLimitError",
            Self::Transient(_) => "TransientError",
            Self::Delivery { .. } => "DeliveryError",
            Self::Auth { .. } => "AuthError",
            Self::Persistence(_) => "PersistenceError",
            Self::RetriesExhausted { .. } => "RetriesExhausted",
            Self::Internal(_) => "InternalError",
        }
    }
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
