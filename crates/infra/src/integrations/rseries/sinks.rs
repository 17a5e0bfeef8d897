//! Record sinks for the R-Series streams

use async_trait::async_trait;
use rseries_core::{OrderSubmissionService, RecordSink};
use rseries_domain::{OrderPayload, Record, Result, SinkContext, SubmissionOutcome};
use serde_json::Map;
use tracing::warn;

/// Purchase orders: one Order plus its OrderLines per record.
pub struct BuyOrdersSink {
    service: OrderSubmissionService,
}

impl BuyOrdersSink {
    pub fn new(service: OrderSubmissionService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RecordSink for BuyOrdersSink {
    type Payload = OrderPayload;

    fn preprocess(&self, record: &Record, _context: &SinkContext) -> Result<OrderPayload> {
        self.service.prepare(record)
    }

    async fn submit(&self, payload: OrderPayload, _context: &SinkContext) -> SubmissionOutcome {
        self.service.submit(payload).await
    }
}

/// Streams without a dedicated sink. Never calls the provider.
#[derive(Debug, Default)]
pub struct FallbackSink;

#[async_trait]
impl RecordSink for FallbackSink {
    type Payload = Record;

    fn preprocess(&self, record: &Record, _context: &SinkContext) -> Result<Record> {
        Ok(record.clone())
    }

    async fn submit(&self, payload: Record, context: &SinkContext) -> SubmissionOutcome {
        warn!(stream = %context.stream, record = ?payload, "No sink for stream, record dropped");
        SubmissionOutcome::failure(Map::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn fallback_reports_failure_without_state() {
        let record = json!({"id": 1}).as_object().cloned().unwrap();
        let outcome = FallbackSink.process_record(&record, &SinkContext::new("Vendors")).await;

        assert!(!outcome.is_success());
        assert!(outcome.external_id().is_none());
        assert!(outcome.diagnostics().is_empty());
    }
}
