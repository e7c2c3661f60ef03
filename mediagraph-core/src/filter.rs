//! Attribute filters over raw fragments and constructed nodes.
//!
//! A predicate record is the `field` / `field__operator` keyed map callers
//! pass around (`{"year__gte": 2000, "title__icontains": "alien"}`). It is
//! parsed into typed [`Predicate`]s and evaluated with AND semantics against
//! anything that implements [`FieldSource`].

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::operator::{OPERATOR_SEPARATOR, Operator};

/// Anything whose attributes can be read by name.
///
/// Implemented for JSON fragments and for materialized entities, so the same
/// filter runs before and after construction.
pub trait FieldSource {
    /// Read one attribute. `None` when the attribute is absent.
    fn read_field(&self, name: &str) -> Option<Cow<'_, Value>>;
}

impl FieldSource for Value {
    fn read_field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.as_object()?.get(name).map(Cow::Borrowed)
    }
}

impl FieldSource for Map<String, Value> {
    fn read_field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(Cow::Borrowed)
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn read_field(&self, name: &str) -> Option<Cow<'_, Value>> {
        (**self).read_field(name)
    }
}

/// One typed `{field, operator, value}` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Parse a `field` or `field__operator` key.
    pub fn parse(key: &str, value: impl Into<Value>) -> Self {
        let (field, op) = Operator::split_key(key);
        Self::new(field, op, value)
    }

    /// The `field__operator` encoding. Exact matches emit the bare field.
    pub fn key(&self) -> String {
        match self.op {
            Operator::Exact => self.field.clone(),
            op => format!("{}{}{}", self.field, OPERATOR_SEPARATOR, op.name()),
        }
    }

    /// Test the predicate against a source.
    ///
    /// Every value reachable under the field is tried and the predicate
    /// holds when any of them matches. An absent field only satisfies `ne`.
    pub fn matches<S: FieldSource + ?Sized>(&self, source: &S) -> bool {
        let values = field_values(source, &self.field);
        if values.is_empty() {
            return self.op == Operator::Ne;
        }
        values.iter().any(|v| self.op.apply(v, &self.value))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value)
    }
}

/// An AND-combined list of predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `field(__operator)?` condition.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::parse(key, value));
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Parse a predicate record.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        record
            .iter()
            .map(|(key, value)| Predicate::parse(key, value.clone()))
            .collect()
    }

    /// Emit the record encoding of this filter.
    pub fn to_record(&self) -> Map<String, Value> {
        self.predicates
            .iter()
            .map(|p| (p.key(), p.value.clone()))
            .collect()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether any predicate constrains `field`.
    pub fn constrains(&self, field: &str) -> bool {
        self.predicates.iter().any(|p| p.field == field)
    }

    pub fn matches<S: FieldSource + ?Sized>(&self, source: &S) -> bool {
        self.predicates.iter().all(|p| p.matches(source))
    }
}

impl FromIterator<Predicate> for Filter {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| Predicate::parse(k.as_ref(), v))
            .collect()
    }
}

impl From<&Map<String, Value>> for Filter {
    fn from(record: &Map<String, Value>) -> Self {
        Self::from_record(record)
    }
}

/// Filters serialize as their predicate record.
impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_record(&record))
    }
}

/// Evaluate a raw predicate record against a candidate.
pub fn evaluate<S: FieldSource + ?Sized>(candidate: &S, record: &Map<String, Value>) -> bool {
    record.iter().all(|(key, expected)| {
        let (field, op) = Operator::split_key(key);
        let values = field_values(candidate, field);
        if values.is_empty() {
            return op == Operator::Ne;
        }
        values.iter().any(|v| op.apply(v, expected))
    })
}

/// Collect the values a field name refers to.
///
/// A literal attribute wins. Otherwise a `__`-separated name walks nested
/// objects, fanning out over arrays, e.g. `Media__Part__file`.
fn field_values<'a, S: FieldSource + ?Sized>(source: &'a S, field: &str) -> Vec<Cow<'a, Value>> {
    if let Some(value) = source.read_field(field) {
        return vec![value];
    }
    let Some((head, tail)) = field.split_once(OPERATOR_SEPARATOR) else {
        return Vec::new();
    };
    let rest: Vec<&str> = tail.split(OPERATOR_SEPARATOR).collect();
    let Some(root) = source.read_field(head) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    walk(root.as_ref(), &rest, &mut out);
    out.into_iter().map(Cow::Owned).collect()
}

fn walk(value: &Value, segments: &[&str], out: &mut Vec<Value>) {
    if let Value::Array(items) = value {
        for item in items {
            walk(item, segments, out);
        }
        return;
    }
    match segments.split_first() {
        None => out.push(value.clone()),
        Some((segment, rest)) => {
            if let Some(child) = value.get(*segment) {
                walk(child, rest, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie() -> Value {
        json!({
            "key": "/library/metadata/7",
            "type": "movie",
            "title": "Alien",
            "year": "1979",
            "rating": 8.5,
            "Genre": [{"tag": "Horror"}, {"tag": "Sci-Fi"}],
            "Media": [{"Part": [{"file": "/movies/Alien (1979).mkv"}]}]
        })
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&movie()));
        assert!(Filter::new().matches(&json!(null)));
        assert!(evaluate(&movie(), &Map::new()));
    }

    #[test]
    fn every_present_field_matches_itself() {
        let candidate = movie();
        for (field, value) in candidate.as_object().unwrap() {
            let mut record = Map::new();
            record.insert(field.clone(), value.clone());
            assert!(evaluate(&candidate, &record), "field {field} failed");
        }
    }

    #[test]
    fn iexact_ignores_case() {
        let record = json!({"title__iexact": "foo"});
        assert!(evaluate(&json!({"title": "Foo"}), record.as_object().unwrap()));
    }

    #[test]
    fn predicates_are_and_combined() {
        let filter = Filter::new()
            .with("year__gte", 1970)
            .with("title__istartswith", "ali");
        assert!(filter.matches(&movie()));

        let filter = filter.with("rating__lt", 5);
        assert!(!filter.matches(&movie()));
    }

    #[test]
    fn missing_field_only_satisfies_ne() {
        assert!(!Filter::new().with("studio", "Fox").matches(&movie()));
        assert!(Filter::new().with("studio__ne", "Fox").matches(&movie()));
    }

    #[test]
    fn nested_fields_fan_out_over_arrays() {
        assert!(Filter::new().with("Genre__tag", "Sci-Fi").matches(&movie()));
        assert!(!Filter::new().with("Genre__tag", "Comedy").matches(&movie()));
        assert!(
            Filter::new()
                .with("Media__Part__file__endswith", ".mkv")
                .matches(&movie())
        );
    }

    #[test]
    fn record_encoding_round_trips() {
        let filter: Filter = [("year__gte", json!(2000)), ("title", json!("Heat"))]
            .into_iter()
            .collect();
        let record = filter.to_record();
        assert_eq!(record.get("year__gte"), Some(&json!(2000)));
        assert_eq!(record.get("title"), Some(&json!("Heat")));
        assert_eq!(Filter::from_record(&record).to_record(), record);
    }

    #[test]
    fn deserializes_from_a_json_record() {
        let filter: Filter =
            serde_json::from_value(json!({"year__gte": 1970, "Genre__tag": "Horror"})).unwrap();
        assert_eq!(filter.predicates().len(), 2);
        assert!(filter.constrains("year"));
        assert!(filter.matches(&movie()));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"year__gte": 1970, "Genre__tag": "Horror"})
        );
    }

    #[test]
    fn type_mismatch_is_false_not_a_panic() {
        let filter = Filter::new().with("Genre__gt", 3).with("title__in", 4);
        assert!(!filter.matches(&movie()));
    }
}
