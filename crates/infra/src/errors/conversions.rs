//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use reqwest::Error as HttpError;
use rseries_common::resilience::RetryError;
use rseries_domain::ConnectorError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ConnectorError);

impl From<InfraError> for ConnectorError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ConnectorError> for InfraError {
    fn from(value: ConnectorError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoConnectorError {
    fn into_connector(self) -> ConnectorError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ConnectorError */
/* -------------------------------------------------------------------------- */

impl IntoConnectorError for HttpError {
    fn into_connector(self) -> ConnectorError {
        if self.is_timeout() {
            return ConnectorError::Transient(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ConnectorError::Transient(format!("HTTP connection failure: {self}"));
        }

        if self.is_request() || self.is_body() {
            return ConnectorError::Transient(format!("HTTP request failed: {self}"));
        }

        if self.is_builder() {
            return ConnectorError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return ConnectorError::Internal(format!("failed to decode HTTP response: {self}"));
        }

        ConnectorError::Transient(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_connector())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → ConnectorError */
/* -------------------------------------------------------------------------- */

impl IntoConnectorError for IoError {
    fn into_connector(self) -> ConnectorError {
        ConnectorError::Persistence(format!("{:?}: {self}", self.kind()))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_connector())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → ConnectorError */
/* -------------------------------------------------------------------------- */

impl IntoConnectorError for JsonError {
    fn into_connector(self) -> ConnectorError {
        ConnectorError::Config(format!("invalid JSON at line {}: {self}", self.line()))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_connector())
    }
}

/* -------------------------------------------------------------------------- */
/* RetryError<ConnectorError> → ConnectorError */
/* -------------------------------------------------------------------------- */

/// Collapse a retry failure back into the connector taxonomy.
///
/// Non-retryable errors come back unchanged; an exhausted budget becomes
/// [`ConnectorError::RetriesExhausted`] wrapping the last error.
pub fn flatten_retry_error(error: RetryError<ConnectorError>) -> ConnectorError {
    match error {
        RetryError::NonRetryable { source } => source,
        RetryError::AttemptsExhausted { attempts, last } => {
            ConnectorError::RetriesExhausted { attempts, last: Box::new(last) }
        }
        RetryError::TimeoutExceeded { attempts, last: Some(last), .. } => {
            ConnectorError::RetriesExhausted { attempts, last: Box::new(last) }
        }
        RetryError::TimeoutExceeded { elapsed, attempts, last: None } => ConnectorError::Internal(
            format!("retry time budget exhausted after {elapsed:?} ({attempts} attempts)"),
        ),
        RetryError::InvalidConfiguration { message } => ConnectorError::Config(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
