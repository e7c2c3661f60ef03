//! Detail-fetch path construction for partially loaded entities.
//!
//! Listing endpoints return an abbreviated shape of every item. The per-item
//! endpoint returns the full shape, and inclusion flags appended to its
//! query string ask the server for related sub-objects (chapters, markers,
//! extras). Exclusion parameters trim the response and are only sent when a
//! caller asks for them.

use std::collections::BTreeMap;

use serde_json::Value;
use url::form_urlencoded;

/// Default value of an inclusion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl Flag {
    pub fn to_value(self) -> Value {
        match self {
            Flag::Bool(b) => Value::Bool(b),
            Flag::Int(i) => Value::from(i),
            Flag::Str(s) => Value::from(s),
        }
    }
}

/// Call-site overrides for inclusion flags and exclusion parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailsOptions {
    values: BTreeMap<String, Value>,
}

impl DetailsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Query-string form of a flag value, or `None` when the flag is omitted.
///
/// `false`, `0`, `"0"` and `null` omit the flag; `true` is sent as `1`.
pub fn serialize_flag(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("1".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s == "0" => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Build the detail-fetch path for `key`.
///
/// Flags are appended in declaration order, overrides replacing defaults,
/// followed by any exclusion parameters the caller supplied. Returns `None`
/// for an empty key so a reload fails instead of hitting the server root.
pub fn details_path(
    key: &str,
    includes: &[(&str, Flag)],
    excludes: &[&str],
    options: &DetailsOptions,
) -> Option<String> {
    if key.is_empty() {
        return None;
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut appended = false;
    for (name, default) in includes {
        let resolved = match options.get(name) {
            Some(value) => serialize_flag(value),
            None => serialize_flag(&default.to_value()),
        };
        if let Some(value) = resolved {
            query.append_pair(name, &value);
            appended = true;
        }
    }
    for name in excludes {
        if let Some(value) = options.get(name).and_then(serialize_flag) {
            query.append_pair(name, &value);
            appended = true;
        }
    }

    if !appended {
        return Some(key.to_string());
    }
    let separator = if key.contains('?') { '&' } else { '?' };
    Some(format!("{key}{separator}{}", query.finish()))
}
