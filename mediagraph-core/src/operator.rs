//! The closed set of binary predicates usable in a filter key suffix.
//!
//! Every operator receives the candidate value read from a fragment and the
//! query value supplied by the caller. Catalog payloads are loosely typed
//! (the same attribute may arrive as `"2004"` or `2004`), so the candidate is
//! coerced toward the shape of the query value before comparing. A failed
//! coercion never errors; the operator simply does not match.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Separator between a field name and an operator name in a predicate key.
pub const OPERATOR_SEPARATOR: &str = "__";

/// A named binary predicate `(candidate, query) -> bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Strict equality.
    Exact,
    /// Case-insensitive equality.
    IExact,
    /// The query value contains the candidate as a substring.
    Contains,
    /// Case-insensitive [`Operator::Contains`].
    IContains,
    /// Inequality.
    Ne,
    /// The candidate is an element of an array query, a key of an object
    /// query, or a substring of a string query.
    In,
    /// Candidate greater than query.
    Gt,
    /// Candidate greater than or equal to query.
    Gte,
    /// Candidate less than query.
    Lt,
    /// Candidate less than or equal to query.
    Lte,
    /// The candidate starts with the query.
    StartsWith,
    /// Case-insensitive [`Operator::StartsWith`].
    IStartsWith,
    /// The candidate ends with the query.
    EndsWith,
    /// Case-insensitive [`Operator::EndsWith`].
    IEndsWith,
}

impl Operator {
    /// Every registered operator, in registry order.
    pub const ALL: [Operator; 14] = [
        Operator::Exact,
        Operator::IExact,
        Operator::Contains,
        Operator::IContains,
        Operator::Ne,
        Operator::In,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::StartsWith,
        Operator::IStartsWith,
        Operator::EndsWith,
        Operator::IEndsWith,
    ];

    /// Name used as the key suffix.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Exact => "exact",
            Operator::IExact => "iexact",
            Operator::Contains => "contains",
            Operator::IContains => "icontains",
            Operator::Ne => "ne",
            Operator::In => "in",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::StartsWith => "startswith",
            Operator::IStartsWith => "istartswith",
            Operator::EndsWith => "endswith",
            Operator::IEndsWith => "iendswith",
        }
    }

    /// Look up an operator by its suffix name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Split a predicate key into `(field, operator)`.
    ///
    /// `year__gte` resolves to `("year", Gte)`. A key without a recognised
    /// suffix is a plain field compared with [`Operator::Exact`], so
    /// `Media__Part__file` stays whole.
    pub fn split_key(key: &str) -> (&str, Operator) {
        match key.rsplit_once(OPERATOR_SEPARATOR) {
            Some((field, suffix)) => match Self::from_name(suffix) {
                Some(op) => (field, op),
                None => (key, Operator::Exact),
            },
            None => (key, Operator::Exact),
        }
    }

    /// Evaluate the operator. Mismatched value shapes yield `false`.
    pub fn apply(self, candidate: &Value, query: &Value) -> bool {
        match self {
            Operator::Exact => loose_eq(candidate, query),
            Operator::Ne => !loose_eq(candidate, query),
            Operator::IExact => text_pair(candidate, query, true)
                .is_some_and(|(v, q)| v == q),
            Operator::Contains => text_pair(candidate, query, false)
                .is_some_and(|(v, q)| q.contains(v.as_ref())),
            Operator::IContains => text_pair(candidate, query, true)
                .is_some_and(|(v, q)| q.contains(v.as_ref())),
            Operator::In => member_of(candidate, query),
            Operator::Gt => ordering(candidate, query).is_some_and(Ordering::is_gt),
            Operator::Gte => ordering(candidate, query).is_some_and(Ordering::is_ge),
            Operator::Lt => ordering(candidate, query).is_some_and(Ordering::is_lt),
            Operator::Lte => ordering(candidate, query).is_some_and(Ordering::is_le),
            Operator::StartsWith => text_pair(candidate, query, false)
                .is_some_and(|(v, q)| v.starts_with(q.as_ref())),
            Operator::IStartsWith => text_pair(candidate, query, true)
                .is_some_and(|(v, q)| v.starts_with(q.as_ref())),
            Operator::EndsWith => text_pair(candidate, query, false)
                .is_some_and(|(v, q)| v.ends_with(q.as_ref())),
            Operator::IEndsWith => text_pair(candidate, query, true)
                .is_some_and(|(v, q)| v.ends_with(q.as_ref())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown operator name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// String form of a scalar. Booleans render the way the server writes them.
pub fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "1" } else { "0" })),
        _ => None,
    }
}

/// Numeric form of a scalar, parsing numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Boolean form of a scalar: `true/false`, `1/0`, `"1"/"0"`, `"true"/"false"`.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim() {
            "1" | "true" | "True" => Some(true),
            "0" | "false" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Equality after coercing the candidate toward the query's type.
pub fn loose_eq(candidate: &Value, query: &Value) -> bool {
    match query {
        Value::Null => candidate.is_null(),
        Value::Bool(q) => as_bool(candidate) == Some(*q),
        Value::Number(q) => match (as_number(candidate), q.as_f64()) {
            (Some(v), Some(q)) => v == q,
            _ => false,
        },
        Value::String(q) => as_text(candidate).is_some_and(|v| v == q.as_str()),
        Value::Array(_) | Value::Object(_) => candidate == query,
    }
}

fn text_pair<'a>(
    candidate: &'a Value,
    query: &'a Value,
    fold_case: bool,
) -> Option<(Cow<'a, str>, Cow<'a, str>)> {
    let v = as_text(candidate)?;
    let q = as_text(query)?;
    if fold_case {
        Some((Cow::Owned(v.to_lowercase()), Cow::Owned(q.to_lowercase())))
    } else {
        Some((v, q))
    }
}

fn member_of(candidate: &Value, query: &Value) -> bool {
    match query {
        Value::Array(items) => items.iter().any(|item| loose_eq(candidate, item)),
        Value::Object(map) => {
            as_text(candidate).is_some_and(|v| map.contains_key(v.as_ref()))
        }
        Value::String(haystack) => {
            as_text(candidate).is_some_and(|v| haystack.contains(v.as_ref()))
        }
        _ => false,
    }
}

/// Numeric ordering when both sides are numeric, otherwise lexicographic
/// ordering for string queries (ISO dates compare correctly this way).
fn ordering(candidate: &Value, query: &Value) -> Option<Ordering> {
    if let (Some(v), Some(q)) = (as_number(candidate), as_number(query)) {
        return v.partial_cmp(&q);
    }
    match (candidate, query) {
        (Value::String(v), Value::String(q)) => Some(v.as_str().cmp(q.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_key_recognises_known_suffixes() {
        assert_eq!(Operator::split_key("year__gte"), ("year", Operator::Gte));
        assert_eq!(Operator::split_key("title"), ("title", Operator::Exact));
        assert_eq!(
            Operator::split_key("title__istartswith"),
            ("title", Operator::IStartsWith)
        );
    }

    #[test]
    fn split_key_keeps_unknown_suffix_in_field() {
        assert_eq!(
            Operator::split_key("Media__Part__file"),
            ("Media__Part__file", Operator::Exact)
        );
        assert_eq!(
            Operator::split_key("Media__Part__file__endswith"),
            ("Media__Part__file", Operator::EndsWith)
        );
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for op in Operator::ALL {
            assert_eq!(op.name().parse::<Operator>(), Ok(op));
        }
        assert!("regex".parse::<Operator>().is_err());
    }

    #[test]
    fn contains_reads_query_as_haystack() {
        assert!(Operator::Contains.apply(&json!("Matrix"), &json!("The Matrix Reloaded")));
        assert!(!Operator::Contains.apply(&json!("The Matrix Reloaded"), &json!("Matrix")));
        assert!(Operator::IContains.apply(&json!("matrix"), &json!("The MATRIX")));
    }

    #[test]
    fn exact_coerces_candidate_toward_query_type() {
        assert!(Operator::Exact.apply(&json!("1999"), &json!(1999)));
        assert!(Operator::Exact.apply(&json!(1999), &json!("1999")));
        assert!(Operator::Exact.apply(&json!("1"), &json!(true)));
        assert!(!Operator::Exact.apply(&json!("abc"), &json!(12)));
        assert!(Operator::Ne.apply(&json!("abc"), &json!(12)));
    }

    #[test]
    fn ordering_is_numeric_then_lexicographic() {
        assert!(Operator::Gte.apply(&json!("2004"), &json!(2000)));
        assert!(Operator::Lt.apply(&json!(9), &json!("10")));
        assert!(Operator::Gt.apply(&json!("2021-05-01"), &json!("2020-12-31")));
        assert!(!Operator::Gt.apply(&json!([1]), &json!(0)));
    }

    #[test]
    fn in_accepts_arrays_objects_and_strings() {
        assert!(Operator::In.apply(&json!("show"), &json!(["movie", "show"])));
        assert!(Operator::In.apply(&json!("a"), &json!({"a": 1})));
        assert!(Operator::In.apply(&json!("ov"), &json!("movie")));
        assert!(!Operator::In.apply(&json!("x"), &json!(3)));
    }

    #[test]
    fn prefix_and_suffix_operators() {
        assert!(Operator::StartsWith.apply(&json!("/library/metadata/1"), &json!("/library")));
        assert!(!Operator::StartsWith.apply(&json!("/Library"), &json!("/library")));
        assert!(Operator::IStartsWith.apply(&json!("/Library"), &json!("/library")));
        assert!(Operator::EndsWith.apply(&json!("movie.mkv"), &json!(".mkv")));
        assert!(Operator::IEndsWith.apply(&json!("MOVIE.MKV"), &json!(".mkv")));
    }
}
