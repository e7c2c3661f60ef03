//! Conversions from typed fields back to the payload values filters see.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

pub(crate) fn text(value: &Option<String>) -> Option<Value> {
    value.as_deref().map(Value::from)
}

pub(crate) fn int(value: Option<i64>) -> Option<Value> {
    value.map(Value::from)
}

pub(crate) fn float(value: Option<f64>) -> Option<Value> {
    value.map(Value::from)
}

/// Epoch seconds, the shape the catalog uses for `addedAt` and friends.
pub(crate) fn epoch(value: Option<DateTime<Utc>>) -> Option<Value> {
    value.map(|at| Value::from(at.timestamp()))
}

pub(crate) fn day(value: Option<NaiveDate>) -> Option<Value> {
    value.map(|date| Value::from(date.format("%Y-%m-%d").to_string()))
}

/// Rebuild a sub-collection of single-attribute elements, e.g. `Genre` as
/// `[{"tag": "Drama"}]`, so `Genre__tag` filters keep working on nodes.
pub(crate) fn elements(attribute: &str, values: &[String]) -> Option<Value> {
    let items = values
        .iter()
        .map(|value| {
            let mut element = Map::new();
            element.insert(attribute.to_string(), Value::from(value.as_str()));
            Value::Object(element)
        })
        .collect();
    Some(Value::Array(items))
}
