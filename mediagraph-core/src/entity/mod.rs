//! The entity base contract.
//!
//! Every materialized node is an `Arc`-shared [`Entity`]. Identity (`key`),
//! the path that produced the current fields, the weak parent link and the
//! side table of unrecognised payload keys live in [`EntityCore`]; the typed
//! fields live in the concrete [`Node`].

mod node;
mod payload;

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::filter::FieldSource;
use crate::server::Server;

pub use node::{Fields, Node, downcast};
pub use payload::Payload;

/// Shared handle to any materialized node.
pub type EntityRef = Arc<dyn Entity>;

/// Non-owning handle to any materialized node.
pub type WeakEntity = Weak<dyn Entity>;

/// Behaviour common to every node variant.
#[async_trait]
pub trait Entity: Send + Sync + fmt::Debug + 'static {
    fn core(&self) -> &EntityCore;

    /// Discriminator tag of the sub-collection this variant is read from.
    fn tag(&self) -> &'static str;

    /// Value of the payload `type` attribute this variant represents, if any.
    fn entity_type(&self) -> Option<&'static str>;

    /// Read an attribute by name: `key`, a named field, then the side table.
    fn field(&self, name: &str) -> Option<Value>;

    /// Path of the richest per-item response, derived from the key and the
    /// variant's inclusion flags, or the variant's listing when it declares
    /// one. `None` when the key is empty.
    fn details_path(&self) -> Option<String>;

    /// Re-fetch `details_path` (or `key`) and repopulate in place.
    async fn reload(&self) -> Result<()>;

    /// Re-fetch an explicit path and repopulate in place.
    async fn reload_from(&self, path: &str) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn key(&self) -> &str {
        self.core().key()
    }

    fn initialization_path(&self) -> String {
        self.core().initialization_path()
    }

    /// Whether the current fields came from the per-item detail response.
    ///
    /// Recomputed on every call because each reload moves the
    /// initialization path.
    fn is_full_object(&self) -> bool {
        let key = self.key();
        if key.is_empty() {
            return true;
        }
        let expected = self.details_path().unwrap_or_else(|| key.to_string());
        expected == self.core().initialization_path()
    }

    fn is_partial_object(&self) -> bool {
        !self.is_full_object()
    }
}

impl FieldSource for dyn Entity {
    fn read_field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.field(name).map(Cow::Owned)
    }
}

/// State shared by every variant.
pub struct EntityCore {
    server: Server,
    key: String,
    parent: Option<WeakEntity>,
    initialization_path: RwLock<String>,
    extras: RwLock<Map<String, Value>>,
    auto_reload: AtomicBool,
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("key", &self.key)
            .field("initialization_path", &*self.initialization_path.read())
            .field("has_live_parent", &self.parent().is_some())
            .field("extras", &self.extras.read().len())
            .finish()
    }
}

impl EntityCore {
    pub(crate) fn new(
        server: Server,
        key: String,
        initialization_path: Option<&str>,
        parent: Option<WeakEntity>,
        extras: Map<String, Value>,
    ) -> Self {
        let initialization_path = initialization_path
            .filter(|path| !path.is_empty())
            .map_or_else(|| key.clone(), str::to_string);
        Self {
            server,
            key,
            parent,
            initialization_path: RwLock::new(initialization_path),
            extras: RwLock::new(extras),
            auto_reload: AtomicBool::new(true),
        }
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Server-relative path of the resource. Empty for resources that are
    /// not independently fetchable. Never changes after construction.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path whose response currently populates the fields.
    pub fn initialization_path(&self) -> String {
        self.initialization_path.read().clone()
    }

    pub(crate) fn set_initialization_path(&self, path: &str) {
        *self.initialization_path.write() = path.to_string();
    }

    /// The parent node, if one was given and it is still alive.
    pub fn parent(&self) -> Option<EntityRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// True only when the parent is alive and is a `T`.
    pub fn is_child_of<T: Any>(&self) -> bool {
        self.parent()
            .is_some_and(|parent| parent.as_any().is::<T>())
    }

    /// Payload attribute that no named field consumed.
    pub fn extra(&self, name: &str) -> Option<Value> {
        self.extras.read().get(name).cloned()
    }

    pub fn extras(&self) -> Map<String, Value> {
        self.extras.read().clone()
    }

    pub(crate) fn replace_extras(&self, extras: Map<String, Value>) {
        *self.extras.write() = extras;
    }

    /// Whether accessors upgrade a partial object on demand.
    pub fn auto_reload(&self) -> bool {
        self.auto_reload.load(Ordering::Relaxed)
    }

    pub fn set_auto_reload(&self, enabled: bool) {
        self.auto_reload.store(enabled, Ordering::Relaxed);
    }
}
