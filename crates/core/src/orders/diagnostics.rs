//! Diagnostic state reported back with each submission outcome

use rseries_domain::ConnectorError;
use serde_json::{Map, Value};

pub const ERROR: &str = "error";
pub const ERROR_TYPE: &str = "error_type";
pub const STATUS: &str = "status";
pub const API_RESPONSE: &str = "api_response";
pub const API_ERROR_RESPONSE: &str = "api_error_response";
pub const STAGE: &str = "stage";
pub const LINES_TOTAL: &str = "lines_total";
pub const LINES_SUCCEEDED: &str = "lines_succeeded";
pub const LINES_FAILED: &str = "lines_failed";
pub const FAILED_LINES: &str = "failed_lines";

/// Error description with status and provider body when the error has them.
pub fn error_diagnostics(error: &ConnectorError) -> Map<String, Value> {
    let mut diagnostics = Map::new();
    diagnostics.insert(ERROR.into(), Value::String(error.to_string()));
    diagnostics.insert(ERROR_TYPE.into(), Value::String(error.error_type().into()));
    if let Some(status) = error.status() {
        diagnostics.insert(STATUS.into(), Value::from(status));
    }
    if let Some(body) = error.response_body() {
        diagnostics.insert(API_ERROR_RESPONSE.into(), body);
    }
    diagnostics
}
