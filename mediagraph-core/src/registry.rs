//! Variant registry used to materialize untyped payloads.
//!
//! Builders are keyed `"<tag>.<type>"` (e.g. `Metadata.movie`) or by bare
//! tag for variants without a type (e.g. `Marker`). Lookup tries the typed
//! key first and falls back to the bare tag.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::entity::{EntityRef, Fields, Node, WeakEntity};
use crate::operator::as_text;
use crate::server::Server;

/// Constructor for one registered variant.
pub type BuildFn = fn(&Server, &Value, Option<&str>, Option<WeakEntity>) -> EntityRef;

#[derive(Clone, Default)]
pub struct Registry {
    builders: HashMap<String, BuildFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.builders.keys().collect();
        keys.sort();
        f.debug_struct("Registry").field("variants", &keys).finish()
    }
}

fn build_node<F: Fields>(
    server: &Server,
    data: &Value,
    initialization_path: Option<&str>,
    parent: Option<WeakEntity>,
) -> EntityRef {
    Node::<F>::build(server, data, initialization_path, parent)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register variant `F` under its tag and type.
    pub fn register<F: Fields>(&mut self) -> &mut Self {
        self.builders
            .insert(registry_key(F::TAG, F::TYPE), build_node::<F> as BuildFn);
        self
    }

    /// Builder-style [`Registry::register`].
    pub fn with<F: Fields>(mut self) -> Self {
        self.register::<F>();
        self
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn contains(&self, tag: &str, entity_type: Option<&str>) -> bool {
        self.builders.contains_key(&registry_key(tag, entity_type))
    }

    /// Builder for a fragment read from sub-collection `tag`.
    pub fn lookup(&self, tag: &str, entity_type: Option<&str>) -> Option<BuildFn> {
        entity_type
            .and_then(|t| self.builders.get(&registry_key(tag, Some(t))))
            .or_else(|| self.builders.get(tag))
            .copied()
    }

    /// Build a fragment read from sub-collection `tag`, dispatching on its
    /// `type` attribute. `None` when no variant is registered for it.
    pub fn build(
        &self,
        server: &Server,
        tag: &str,
        data: &Value,
        initialization_path: Option<&str>,
        parent: Option<WeakEntity>,
    ) -> Option<EntityRef> {
        let entity_type = data.get("type").and_then(as_text);
        let builder = self.lookup(tag, entity_type.as_deref())?;
        Some(builder(server, data, initialization_path, parent))
    }
}

fn registry_key(tag: &str, entity_type: Option<&str>) -> String {
    match entity_type {
        Some(t) => format!("{tag}.{t}"),
        None => tag.to_string(),
    }
}
