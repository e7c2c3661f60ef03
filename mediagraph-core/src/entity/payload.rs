use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use super::{Fields, Node, WeakEntity};
use crate::filter::Filter;
use crate::materializer;
use crate::operator::{as_bool, as_number, as_text};
use crate::server::Server;

/// Read-only view of one payload fragment handed to [`Fields::load`].
///
/// Typed getters coerce loosely-typed attributes (`"1979"`, `1979`) and
/// remember what was read; everything left unread ends up in the entity's
/// side table.
pub struct Payload<'a> {
    server: &'a Server,
    data: Option<&'a Map<String, Value>>,
    this: WeakEntity,
    read: RefCell<HashSet<String>>,
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("attributes", &self.data.map_or(0, Map::len))
            .field("read", &self.read.borrow().len())
            .finish()
    }
}

impl<'a> Payload<'a> {
    pub(crate) fn new(server: &'a Server, data: &'a Value, this: WeakEntity) -> Self {
        Self {
            server,
            data: data.as_object(),
            this,
            read: RefCell::new(HashSet::new()),
        }
    }

    pub fn server(&self) -> &Server {
        self.server
    }

    /// Weak handle to the node being populated, for parenting children.
    pub fn this(&self) -> WeakEntity {
        self.this.clone()
    }

    /// Whether the fragment carries `name` at all.
    pub fn has(&self, name: &str) -> bool {
        self.data.is_some_and(|map| map.contains_key(name))
    }

    /// Raw attribute value.
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.mark_read(name);
        self.data?.get(name)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.raw(name).and_then(as_text).map(|text| text.into_owned())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.raw(name)
            .and_then(as_number)
            .filter(|n| n.fract() == 0.0)
            .map(|n| n as i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.raw(name).and_then(as_number)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.raw(name).and_then(as_bool)
    }

    /// Epoch-seconds attribute such as `addedAt`.
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.int(name)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// `YYYY-MM-DD` attribute such as `originallyAvailableAt`.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        let text = self.string(name)?;
        NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok()
    }

    /// `tag` attribute of every element of a tag collection, e.g. `Genre`.
    pub fn tags(&self, name: &str) -> Vec<String> {
        self.pluck(name, "tag")
    }

    /// One attribute of every element of a sub-collection, e.g. the `path`
    /// of each `Location`.
    pub fn pluck(&self, name: &str, attribute: &str) -> Vec<String> {
        self.elements(name)
            .into_iter()
            .filter_map(|element| element.get(attribute).and_then(as_text))
            .map(|text| text.into_owned())
            .collect()
    }

    /// Build every child fragment stored under `C::TAG`, parented to the
    /// node being populated.
    ///
    /// The raw collection is left unread so it stays in the side table and
    /// nested paths such as `Media__Part__file` filter a node exactly as
    /// they filtered its fragment.
    pub fn children<C: Fields>(&self) -> Vec<Arc<Node<C>>> {
        self.children_matching(&Filter::new())
    }

    pub fn children_matching<C: Fields>(&self, filter: &Filter) -> Vec<Arc<Node<C>>> {
        let raw = self.data.and_then(|map| map.get(C::TAG));
        materializer::find_items::<C>(
            collection_of(raw),
            filter,
            self.server,
            Some(self.this()),
        )
    }

    fn elements(&self, name: &str) -> Vec<&'a Value> {
        collection_of(self.raw(name))
    }

    pub(crate) fn mark_read(&self, name: &str) {
        self.read.borrow_mut().insert(name.to_string());
    }

    /// Attributes no getter touched.
    pub(crate) fn into_unread(self) -> Map<String, Value> {
        let read = self.read.into_inner();
        self.data
            .map(|map| {
                map.iter()
                    .filter(|(key, _)| !read.contains(key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn collection_of(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}
