//! Order submission service - core business logic
//!
//! Creating an order and its lines are separate, non-transactional calls.
//! Once the order exists the record counts as delivered; line failures are
//! reported in the diagnostics but never undo the order.

use std::sync::Arc;

use rseries_domain::constants::{ORDER_ENDPOINT, ORDER_LINE_ENDPOINT};
use rseries_domain::{
    ApiRequest, ConnectorError, LinePayload, OrderPayload, Record, Result, SubmissionOutcome,
};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::diagnostics::{
    self, error_diagnostics, API_RESPONSE, FAILED_LINES, LINES_FAILED, LINES_SUCCEEDED,
    LINES_TOTAL, STAGE,
};
use super::extraction::{extract_id, order_id_rules, order_line_id_rules, ExtractionRule, IdMatch};
use super::mapping::OrderMapper;
use crate::connector_ports::RequestExecutor;

/// Progress of one record through the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Mapped,
    OrderSubmitted,
    LinesSubmitted,
    LinesPartial,
    NoLines,
    Done,
    Failed,
}

impl SubmissionStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mapped => "mapped",
            Self::OrderSubmitted => "order_submitted",
            Self::LinesSubmitted => "lines_submitted",
            Self::LinesPartial => "lines_partial",
            Self::NoLines => "no_lines",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug)]
struct FailedLine {
    index: usize,
    payload: Value,
    error: String,
    status: Option<u16>,
    response: Option<Value>,
}

impl FailedLine {
    fn to_json(&self) -> Value {
        json!({
            "index": self.index,
            "payload": self.payload,
            "error": self.error,
            "status": self.status,
            "response": self.response,
        })
    }
}

#[derive(Debug, Default)]
struct LineReport {
    total: usize,
    succeeded: usize,
    failed: Vec<FailedLine>,
}

impl LineReport {
    fn stage(&self) -> SubmissionStage {
        if self.total == 0 {
            SubmissionStage::NoLines
        } else if self.failed.is_empty() {
            SubmissionStage::LinesSubmitted
        } else {
            SubmissionStage::LinesPartial
        }
    }

    fn write_into(&self, diagnostics: &mut Map<String, Value>) {
        diagnostics.insert(LINES_TOTAL.into(), Value::from(self.total));
        diagnostics.insert(LINES_SUCCEEDED.into(), Value::from(self.succeeded));
        diagnostics.insert(LINES_FAILED.into(), Value::from(self.failed.len()));
        if !self.failed.is_empty() {
            diagnostics.insert(
                FAILED_LINES.into(),
                Value::Array(self.failed.iter().map(FailedLine::to_json).collect()),
            );
        }
    }
}

/// Submits mapped orders and their lines through a [`RequestExecutor`].
pub struct OrderSubmissionService {
    executor: Arc<dyn RequestExecutor>,
    mapper: OrderMapper,
    order_rules: Vec<ExtractionRule>,
    line_rules: Vec<ExtractionRule>,
}

impl OrderSubmissionService {
    /// Create a new submission service
    pub fn new(executor: Arc<dyn RequestExecutor>, mapper: OrderMapper) -> Self {
        Self {
            executor,
            mapper,
            order_rules: order_id_rules(),
            line_rules: order_line_id_rules(),
        }
    }

    /// Map a record into an order payload. No network call is made.
    ///
    /// # Errors
    /// Returns a validation error when a required field is missing.
    pub fn prepare(&self, record: &Record) -> Result<OrderPayload> {
        let payload = self.mapper.map_order(record)?;
        debug!(stage = SubmissionStage::Mapped.as_str(), lines = payload.line_items.len());
        Ok(payload)
    }

    /// Map and submit one record.
    pub async fn submit_record(&self, record: &Record) -> SubmissionOutcome {
        match self.prepare(record) {
            Ok(payload) => self.submit(payload).await,
            Err(err) => {
                error!(error = %err, "Order mapping failed");
                failed(error_diagnostics(&err))
            }
        }
    }

    /// Create the order, then each of its lines.
    #[instrument(skip_all, fields(lines = payload.line_items.len()))]
    pub async fn submit(&self, payload: OrderPayload) -> SubmissionOutcome {
        let body = payload.body();
        info!(endpoint = ORDER_ENDPOINT, payload = %body, "Creating order");

        let request = ApiRequest::post(ORDER_ENDPOINT, body.clone());
        let response = match self.executor.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, payload = %body, "Order request failed");
                return failed(error_diagnostics(&err));
            }
        };

        if !response.is_success() {
            let status = response.status;
            let err = ConnectorError::Delivery { status, body: response.body };
            error!(status, error = %err, payload = %body, "Order rejected by provider");
            return failed(error_diagnostics(&err));
        }

        let response_body = response.body_value();
        let order_id = match extract_id(&self.order_rules, &response_body) {
            IdMatch::Found { id, rule } => {
                info!(order_id = %id, rule = %rule, "Order created");
                id
            }
            IdMatch::NoMatch => {
                error!(response = %response_body, "No orderID in API response");
                let mut diag = Map::new();
                diag.insert(diagnostics::ERROR.into(), Value::from("No orderID in API response"));
                diag.insert(API_RESPONSE.into(), response_body);
                diag.insert(diagnostics::STATUS.into(), Value::from(response.status));
                return failed(diag);
            }
        };
        debug!(stage = SubmissionStage::OrderSubmitted.as_str(), order_id = %order_id);

        let report = self.submit_lines(&order_id, &payload.line_items).await;
        let stage = report.stage();
        if stage == SubmissionStage::LinesPartial {
            warn!(
                order_id = %order_id,
                failed = report.failed.len(),
                "Order created but some order lines failed; lines may need manual addition"
            );
        }

        let mut diag = Map::new();
        report.write_into(&mut diag);
        diag.insert(STAGE.into(), Value::from(stage.as_str()));
        debug!(stage = SubmissionStage::Done.as_str(), order_id = %order_id);

        SubmissionOutcome::success(order_id, diag)
    }

    async fn submit_lines(&self, order_id: &str, lines: &[Record]) -> LineReport {
        let mut report = LineReport { total: lines.len(), ..LineReport::default() };
        if lines.is_empty() {
            return report;
        }
        info!(order_id, count = lines.len(), "Processing order lines");

        for (index, line) in lines.iter().enumerate() {
            let position = index + 1;
            let payload = match self.mapper.map_line(order_id, line) {
                Ok(payload) => payload,
                Err(err) => {
                    let raw = Value::Object(line.clone());
                    error!(position, error = %err, line = %raw, "Order line mapping failed");
                    report.failed.push(FailedLine {
                        index,
                        payload: raw,
                        error: err.to_string(),
                        status: None,
                        response: None,
                    });
                    continue;
                }
            };

            match self.submit_line(position, lines.len(), &payload).await {
                Ok(()) => report.succeeded += 1,
                Err(err) => {
                    error!(
                        position,
                        error = %err,
                        error_type = err.error_type(),
                        payload = %payload.body(),
                        response = ?err.response_body(),
                        "Error creating order line"
                    );
                    report.failed.push(FailedLine {
                        index,
                        payload: payload.body(),
                        error: err.to_string(),
                        status: err.status(),
                        response: err.response_body(),
                    });
                }
            }
        }

        info!(
            order_id,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Order lines processing complete"
        );
        report
    }

    async fn submit_line(&self, position: usize, total: usize, payload: &LinePayload) -> Result<()> {
        info!(
            position,
            total,
            endpoint = ORDER_LINE_ENDPOINT,
            payload = %payload.body(),
            "Creating order line"
        );

        let response = self
            .executor
            .execute(ApiRequest::post(ORDER_LINE_ENDPOINT, payload.body()))
            .await?
            .error_for_status()?;

        match extract_id(&self.line_rules, &response.body_value()) {
            IdMatch::Found { id, .. } => info!(position, order_line_id = %id, "Order line created"),
            IdMatch::NoMatch => {
                warn!(
                    position,
                    response = %response.body,
                    "Order line created but no orderLineID in response"
                );
            }
        }
        Ok(())
    }
}

fn failed(mut diagnostics: Map<String, Value>) -> SubmissionOutcome {
    diagnostics.insert(STAGE.into(), Value::from(SubmissionStage::Failed.as_str()));
    SubmissionOutcome::failure(diagnostics)
}
