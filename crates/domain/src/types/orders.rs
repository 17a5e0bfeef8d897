//! Order and order-line payloads

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized upstream record, keyed by field name.
pub type Record = Map<String, Value>;

/// Mapped order ready for `POST /Order.json`.
///
/// `fields` only carries keys that had a value; optional fields are omitted
/// instead of being sent as null. `line_items` are the raw line records that
/// become [`LinePayload`]s once the order id is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub line_items: Vec<Record>,
}

impl OrderPayload {
    /// JSON body for the order call (line items are not part of it).
    #[must_use]
    pub fn body(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Body of one `POST /OrderLine.json` call. Every value is a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinePayload(pub BTreeMap<String, String>);

impl LinePayload {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn body(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_body_is_all_strings() {
        let mut line = LinePayload::default();
        line.insert("orderID", "42");
        line.insert("quantity", "3");

        let body = line.body();
        assert_eq!(body["orderID"], Value::String("42".into()));
        assert!(body.as_object().is_some_and(|m| m.values().all(Value::is_string)));
    }

    #[test]
    fn order_body_excludes_line_items() {
        let mut fields = Map::new();
        fields.insert("shopID".into(), Value::String("1".into()));
        let payload = OrderPayload { fields, line_items: vec![Map::new()] };

        assert_eq!(payload.body(), serde_json::json!({"shopID": "1"}));
    }
}
