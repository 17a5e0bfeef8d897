//! Per-record submission outcome

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context handed to sinks alongside each record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkContext {
    pub stream: String,
}

impl SinkContext {
    pub fn new(stream: impl Into<String>) -> Self {
        Self { stream: stream.into() }
    }
}

/// Result of submitting one record.
///
/// Either a success carrying the external id, or a failure without one.
/// Only [`SubmissionOutcome::success`] and [`SubmissionOutcome::failure`]
/// can build it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    external_id: Option<String>,
    success: bool,
    diagnostics: Map<String, Value>,
}

impl SubmissionOutcome {
    pub fn success(external_id: impl Into<String>, diagnostics: Map<String, Value>) -> Self {
        Self { external_id: Some(external_id.into()), success: true, diagnostics }
    }

    #[must_use]
    pub const fn failure(diagnostics: Map<String, Value>) -> Self {
        Self { external_id: None, success: false, diagnostics }
    }

    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// State updates reported back to the upstream collaborator.
    #[must_use]
    pub const fn diagnostics(&self) -> &Map<String, Value> {
        &self.diagnostics
    }

    #[must_use]
    pub fn into_parts(self) -> (Option<String>, bool, Map<String, Value>) {
        (self.external_id, self.success, self.diagnostics)
    }
}
