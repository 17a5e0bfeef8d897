//! Port interfaces for record sinks

use async_trait::async_trait;
use rseries_domain::{Record, Result, SinkContext, SubmissionOutcome};
use tracing::error;

use super::diagnostics::error_diagnostics;

/// A destination for one stream's records.
///
/// The upstream dispatcher calls [`RecordSink::preprocess`] and then
/// [`RecordSink::submit`] for every record, one record at a time.
#[async_trait]
pub trait RecordSink: Send + Sync {
    type Payload: Send;

    /// Build the payload for `record` without touching the network.
    fn preprocess(&self, record: &Record, context: &SinkContext) -> Result<Self::Payload>;

    /// Deliver a prepared payload.
    async fn submit(&self, payload: Self::Payload, context: &SinkContext) -> SubmissionOutcome;

    /// Preprocess then submit; preprocessing errors become failure outcomes.
    async fn process_record(&self, record: &Record, context: &SinkContext) -> SubmissionOutcome {
        match self.preprocess(record, context) {
            Ok(payload) => self.submit(payload, context).await,
            Err(err) => {
                error!(stream = %context.stream, error = %err, "Failed to preprocess record");
                SubmissionOutcome::failure(error_diagnostics(&err))
            }
        }
    }
}
