//! Record to payload mapping for purchase orders
//!
//! Pure functions, no network. Field aliases are tried in order and the first
//! truthy value wins, where empty strings, zero, `false`, `null` and empty
//! collections count as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use rseries_domain::{ConnectorError, LinePayload, OrderPayload, Record, Result};
use serde_json::{Map, Value};
use tracing::warn;

const REF_NUM_ALIASES: &[&str] = &["BuyOrder.ID", "id", "externalid", "refNum"];
const ORDERED_DATE_ALIASES: &[&str] = &["OrderDate", "transaction_date", "orderedDate"];
const ARRIVAL_DATE_ALIASES: &[&str] = &["expectedDeliveryDate", "created_at", "arrivalDate"];
const VENDOR_ALIASES: &[&str] = &["SupplierRemoteId", "supplier_remoteId", "vendorID"];

/// Copied only when truthy.
const TEXT_FIELDS: &[&str] = &["shipInstructions", "stockInstructions"];
/// Copied whenever present and not null, so `0` is kept.
const AMOUNT_FIELDS: &[&str] = &["shipCost", "otherCost", "discount"];

const NAIVE_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];
const UTC_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";
/// Microsecond precision whenever a fraction is present.
const UTC_OUTPUT_FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.6f+00:00";

/// Maps upstream order records to order and line payloads.
#[derive(Debug, Clone, Default)]
pub struct OrderMapper {
    default_shop_id: Option<String>,
}

impl OrderMapper {
    /// `default_shop_id` is used when a record carries no `shopID` of its own.
    pub fn new(default_shop_id: Option<String>) -> Self {
        Self { default_shop_id: default_shop_id.filter(|s| !s.is_empty()) }
    }

    /// Build the order payload for one record.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Validation`] when no shop id is available.
    pub fn map_order(&self, record: &Record) -> Result<OrderPayload> {
        let mut fields = Map::new();

        if let Some(ref_num) = first_truthy(record, REF_NUM_ALIASES) {
            fields.insert("refNum".into(), Value::String(stringify(ref_num)));
        }
        if let Some(date) = first_date(record, ORDERED_DATE_ALIASES) {
            fields.insert("orderedDate".into(), Value::String(date));
        }
        if let Some(date) = first_date(record, ARRIVAL_DATE_ALIASES) {
            fields.insert("arrivalDate".into(), Value::String(date));
        }
        if let Some(vendor) = first_truthy(record, VENDOR_ALIASES) {
            fields.insert("vendorID".into(), Value::String(stringify(vendor)));
        }

        let shop_id = record
            .get("shopID")
            .filter(|v| is_truthy(v))
            .map(stringify)
            .or_else(|| self.default_shop_id.clone())
            .ok_or_else(|| {
                ConnectorError::Validation(
                    "shopID is required but not found in record or config (buyorders_shop_id)"
                        .into(),
                )
            })?;
        fields.insert("shopID".into(), Value::String(shop_id));

        for key in TEXT_FIELDS {
            if let Some(value) = record.get(*key).filter(|v| is_truthy(v)) {
                fields.insert((*key).into(), value.clone());
            }
        }
        for key in AMOUNT_FIELDS {
            if let Some(value) = record.get(*key).filter(|v| !v.is_null()) {
                fields.insert((*key).into(), value.clone());
            }
        }

        Ok(OrderPayload { fields, line_items: parse_line_items(record.get("line_items")) })
    }

    /// Build the payload of one order line. Every value is a string.
    ///
    /// # Errors
    /// Returns [`ConnectorError::Validation`] when `quantity` or the item id is
    /// missing.
    pub fn map_line(&self, order_id: &str, line: &Record) -> Result<LinePayload> {
        let quantity = line
            .get("quantity")
            .filter(|v| !v.is_null())
            .ok_or_else(|| ConnectorError::Validation("order line is missing quantity".into()))?;
        let item_id = first_truthy(line, &["productId", "product_remoteId"]).ok_or_else(|| {
            ConnectorError::Validation("order line is missing productId/product_remoteId".into())
        })?;

        let mut payload = LinePayload::default();
        payload.insert("orderID", order_id);
        payload.insert("quantity", stringify(quantity));
        payload.insert("itemID", stringify(item_id));

        let price = first_truthy(line, &["OptiplySupplierProductPrice"])
            .or_else(|| line.get("price").filter(|v| !v.is_null()));
        let optional = [
            ("price", price),
            ("originalPrice", line.get("originalPrice")),
            ("numReceived", line.get("numReceived")),
            ("vendorCost", line.get("vendorCost")),
        ];
        for (key, value) in optional {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                payload.insert(key, stringify(value));
            }
        }

        Ok(payload)
    }
}

/// Normalize a date value to an offset-carrying ISO-8601 string.
///
/// Returns `None` for null and empty values.
pub fn normalize_date(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(normalize_date_str(s)),
        other => Some(stringify(other)),
    }
}

fn normalize_date_str(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(stripped) = trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        return format!("{stripped}+00:00");
    }
    if DateTime::parse_from_rfc3339(trimmed).is_ok() {
        return raw.to_string();
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return format_utc(naive);
        }
    }
    if let Some(midnight) =
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return format_utc(midnight);
    }

    warn!(value = raw, "Could not parse date, sending it unchanged");
    raw.to_string()
}

fn format_utc(naive: NaiveDateTime) -> String {
    let format =
        if naive.nanosecond() == 0 { UTC_OUTPUT_FORMAT } else { UTC_OUTPUT_FORMAT_FRACTIONAL };
    naive.format(format).to_string()
}

/// Accepts a JSON array or a JSON-encoded string of one.
fn parse_line_items(value: Option<&Value>) -> Vec<Record> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => return Vec::new(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                let preview: String = s.chars().take(100).collect();
                warn!(line_items = %preview, "Failed to parse line_items as a JSON array");
                return Vec::new();
            }
        },
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            warn!(kind = value_kind(other), "Unexpected line_items type, ignoring");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(map) => Some(map),
            other => {
                warn!(index, kind = value_kind(&other), "Skipping non-object line item");
                None
            }
        })
        .collect()
}

fn first_truthy<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| record.get(*key)).find(|value| is_truthy(value))
}

fn first_date(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| record.get(*key)).find_map(normalize_date)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Strings as-is, everything else in its JSON form.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn maps_aliases_in_priority_order() {
        let mapper = OrderMapper::new(Some("5".into()));
        let payload = mapper
            .map_order(&record(json!({
                "BuyOrder.ID": "",
                "id": 1001,
                "refNum": "ignored",
                "supplier_remoteId": 77,
                "transaction_date": "2025-01-02",
            })))
            .unwrap();

        assert_eq!(payload.field("refNum"), Some(&json!("1001")));
        assert_eq!(payload.field("vendorID"), Some(&json!("77")));
        assert_eq!(payload.field("shopID"), Some(&json!("5")));
        assert_eq!(payload.field("orderedDate"), Some(&json!("2025-01-02T00:00:00+00:00")));
        assert!(payload.field("arrivalDate").is_none());
    }

    #[test]
    fn record_shop_id_wins_over_config() {
        let mapper = OrderMapper::new(Some("5".into()));
        let payload = mapper.map_order(&record(json!({"shopID": 9}))).unwrap();
        assert_eq!(payload.field("shopID"), Some(&json!("9")));
    }

    #[test]
    fn missing_shop_id_is_a_validation_error() {
        let mapper = OrderMapper::new(None);
        let err = mapper.map_order(&record(json!({"id": "1"}))).unwrap_err();
        assert!(matches!(err, ConnectorError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn optional_fields_follow_truthiness_rules() {
        let mapper = OrderMapper::new(Some("1".into()));
        let payload = mapper
            .map_order(&record(json!({
                "shipInstructions": "",
                "stockInstructions": "back door",
                "shipCost": 0,
                "otherCost": null,
                "discount": 2.5,
            })))
            .unwrap();

        assert!(payload.field("shipInstructions").is_none());
        assert_eq!(payload.field("stockInstructions"), Some(&json!("back door")));
        assert_eq!(payload.field("shipCost"), Some(&json!(0)));
        assert!(payload.field("otherCost").is_none());
        assert_eq!(payload.field("discount"), Some(&json!(2.5)));
    }

    #[test]
    fn normalizes_dates() {
        assert_eq!(
            normalize_date(&json!("2025-12-05T08:55:00Z")).as_deref(),
            Some("2025-12-05T08:55:00+00:00")
        );
        assert_eq!(
            normalize_date(&json!("2025-12-05T08:55:00-05:00")).as_deref(),
            Some("2025-12-05T08:55:00-05:00")
        );
        assert_eq!(
            normalize_date(&json!("2025-12-05T08:55:00")).as_deref(),
            Some("2025-12-05T08:55:00+00:00")
        );
        assert_eq!(
            normalize_date(&json!("2025-12-05 08:55:00.250")).as_deref(),
            Some("2025-12-05T08:55:00.250000+00:00")
        );
        assert_eq!(
            normalize_date(&json!("2025-12-05T08:55:00.000001")).as_deref(),
            Some("2025-12-05T08:55:00.000001+00:00")
        );
        assert_eq!(normalize_date(&json!("next tuesday")).as_deref(), Some("next tuesday"));
        assert_eq!(normalize_date(&json!(1_733_388_900)).as_deref(), Some("1733388900"));
        assert_eq!(normalize_date(&json!("")), None);
        assert_eq!(normalize_date(&Value::Null), None);
    }

    #[test]
    fn empty_date_falls_through_to_next_alias() {
        let mapper = OrderMapper::new(Some("1".into()));
        let payload = mapper
            .map_order(&record(json!({"OrderDate": "", "orderedDate": "2025-03-01T10:00:00Z"})))
            .unwrap();
        assert_eq!(payload.field("orderedDate"), Some(&json!("2025-03-01T10:00:00+00:00")));
    }

    #[test]
    fn line_items_accept_string_or_array() {
        let mapper = OrderMapper::new(Some("1".into()));

        let from_string = mapper
            .map_order(&record(json!({"line_items": r#"[{"quantity": 1}, 5]"#})))
            .unwrap();
        assert_eq!(from_string.line_items.len(), 1);

        let from_array =
            mapper.map_order(&record(json!({"line_items": [{"quantity": 1}, {}]}))).unwrap();
        assert_eq!(from_array.line_items.len(), 2);

        let malformed = mapper.map_order(&record(json!({"line_items": "[{oops"}))).unwrap();
        assert!(malformed.line_items.is_empty());
        assert!(malformed.field("line_items").is_none());
    }

    #[test]
    fn line_payload_values_are_strings() {
        let mapper = OrderMapper::default();
        let line = mapper
            .map_line(
                "42",
                &record(json!({
                    "quantity": 3,
                    "product_remoteId": 555,
                    "OptiplySupplierProductPrice": null,
                    "price": 9.99,
                    "numReceived": 0,
                })),
            )
            .unwrap();

        assert_eq!(line.get("orderID"), Some("42"));
        assert_eq!(line.get("quantity"), Some("3"));
        assert_eq!(line.get("itemID"), Some("555"));
        assert_eq!(line.get("price"), Some("9.99"));
        assert_eq!(line.get("numReceived"), Some("0"));
        assert_eq!(line.get("vendorCost"), None);
    }

    #[test]
    fn line_without_quantity_or_item_fails() {
        let mapper = OrderMapper::default();
        assert!(mapper.map_line("1", &record(json!({"productId": "a"}))).is_err());
        assert!(mapper.map_line("1", &record(json!({"quantity": 2}))).is_err());
    }
}
