//! Identifier extraction from provider responses
//!
//! The provider is not consistent about where it puts created ids, so ids
//! are probed with an ordered list of JSON paths. The first rule yielding a
//! non-empty value wins; running out of rules is an explicit outcome.

use serde_json::Value;

use super::mapping::stringify;

/// One JSON path to probe, e.g. `["Order", "orderID"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRule {
    path: Vec<&'static str>,
}

impl ExtractionRule {
    pub fn new(path: &[&'static str]) -> Self {
        Self { path: path.to_vec() }
    }

    /// Dotted form for logs, e.g. `Order.orderID`.
    pub fn describe(&self) -> String {
        self.path.join(".")
    }

    fn apply(&self, body: &Value) -> Option<String> {
        let value = self.path.iter().try_fold(body, |node, key| node.get(*key))?;
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(stringify(value)),
            _ => None,
        }
    }
}

/// Result of probing a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    Found { id: String, rule: String },
    NoMatch,
}

impl IdMatch {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Found { id, .. } => Some(id),
            Self::NoMatch => None,
        }
    }
}

/// Run `rules` in order against `body`.
pub fn extract_id(rules: &[ExtractionRule], body: &Value) -> IdMatch {
    rules
        .iter()
        .find_map(|rule| rule.apply(body).map(|id| IdMatch::Found { id, rule: rule.describe() }))
        .unwrap_or(IdMatch::NoMatch)
}

/// Created-order id: `Order.orderID`, then `orderID`, then `id`.
pub fn order_id_rules() -> Vec<ExtractionRule> {
    vec![
        ExtractionRule::new(&["Order", "orderID"]),
        ExtractionRule::new(&["orderID"]),
        ExtractionRule::new(&["id"]),
    ]
}

/// Created-line id: `OrderLine.orderLineID`.
pub fn order_line_id_rules() -> Vec<ExtractionRule> {
    vec![ExtractionRule::new(&["OrderLine", "orderLineID"])]
}
