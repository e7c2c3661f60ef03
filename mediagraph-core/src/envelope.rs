//! Response envelope handling.
//!
//! The catalog API answers either with a bare payload or with a single
//! container object wrapping it, e.g.
//! `{"MediaContainer": {"size": 2, "Metadata": [...]}}`. Item fragments live
//! in sub-collections of the container keyed by a discriminator tag.

use serde_json::Value;

use crate::operator::as_number;

/// Sub-collection read when no variant tag applies.
pub const DEFAULT_TAG: &str = "Metadata";

/// Strip an outer `{"<Container>": {...}}` wrapper if present.
///
/// A wrapper is a single-key object whose key starts with an upper-case
/// letter and whose value is itself an object.
pub fn unwrap(payload: &Value) -> &Value {
    match container_entry(payload) {
        Some(inner) => inner,
        None => payload,
    }
}

/// Owned variant of [`unwrap`].
pub fn into_inner(payload: Value) -> Value {
    match payload {
        Value::Object(map) if container_entry_ok(&map) => map
            .into_iter()
            .next()
            .map_or(Value::Null, |(_, inner)| inner),
        other => other,
    }
}

fn container_entry(payload: &Value) -> Option<&Value> {
    let map = payload.as_object()?;
    if !container_entry_ok(map) {
        return None;
    }
    map.values().next()
}

fn container_entry_ok(map: &serde_json::Map<String, Value>) -> bool {
    if map.len() != 1 {
        return false;
    }
    map.iter().next().is_some_and(|(key, value)| {
        key.starts_with(|c: char| c.is_ascii_uppercase()) && value.is_object()
    })
}

/// Fragments stored under `tag` in a (possibly wrapped) payload.
///
/// A bare array is taken as the collection itself, a single object under the
/// tag is a one-element collection, and a missing tag is an empty collection.
pub fn collection<'a>(payload: &'a Value, tag: &str) -> Vec<&'a Value> {
    match unwrap(payload) {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get(tag) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(item @ Value::Object(_)) => vec![item],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// The payload a reload should populate from: the first fragment under
/// `tag` if the container holds one, otherwise the container itself.
pub fn primary_item<'a>(payload: &'a Value, tag: &str) -> &'a Value {
    collection(payload, tag)
        .into_iter()
        .next()
        .unwrap_or_else(|| unwrap(payload))
}

/// Numeric container attribute such as `totalSize` or `offset`.
pub fn container_attr(payload: &Value, name: &str) -> Option<u64> {
    unwrap(payload)
        .get(name)
        .and_then(as_number)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64)
}
