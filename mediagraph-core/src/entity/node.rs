use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Entity, EntityCore, EntityRef, Payload, WeakEntity};
use crate::envelope::{self, DEFAULT_TAG};
use crate::error::{Error, Result};
use crate::filter::FieldSource;
use crate::partial::{self, DetailsOptions, Flag};
use crate::server::Server;
use crate::transport::{Method, QueryRequest};

/// Typed field layout of one node variant.
///
/// A variant declares where its fragments live (`TAG`), which payload
/// `type` it represents, its detail-fetch flags, and two explicit tables:
/// [`Fields::load`] reads named attributes out of a payload and
/// [`Fields::field`] exposes them back by name for filtering.
pub trait Fields: Send + Sync + fmt::Debug + Sized + 'static {
    /// Sub-collection of a response container holding these fragments.
    const TAG: &'static str = DEFAULT_TAG;

    /// Payload `type` attribute of this variant.
    const TYPE: Option<&'static str> = None;

    /// Inclusion flags and their defaults, in query-string order.
    const INCLUDES: &'static [(&'static str, Flag)] = &[];

    /// Exclusion parameters accepted by the detail endpoint.
    const EXCLUDES: &'static [&'static str] = &[];

    /// Listing endpoint that already carries complete fragments of this
    /// variant. When set, the listing is the details path and a reload picks
    /// this node's fragment out of it by key rather than taking the first.
    const LISTING: Option<&'static str> = None;

    /// Identity of a fragment. Defaults to its `key` attribute; variants
    /// whose listings carry a relative or decorated key normalize it here.
    fn read_key(payload: &Payload<'_>) -> String {
        payload.string("key").unwrap_or_default()
    }

    fn load(payload: &Payload<'_>) -> Self;

    fn field(&self, name: &str) -> Option<Value>;
}

/// A materialized node: shared core state plus typed fields.
///
/// Always handed out as `Arc<Node<F>>`. Reloads swap the fields of this same
/// allocation, so every holder of the `Arc` observes the new state.
pub struct Node<F: Fields> {
    core: EntityCore,
    this: Weak<Node<F>>,
    fields: RwLock<F>,
}

impl<F: Fields> fmt::Debug for Node<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("tag", &F::TAG)
            .field("core", &self.core)
            .field("fields", &*self.fields.read())
            .finish()
    }
}

impl<F: Fields> Node<F> {
    /// Construct from a payload fragment.
    ///
    /// `initialization_path` defaults to the fragment's `key`. The parent is
    /// held weakly and never kept alive by its children.
    pub fn build(
        server: &Server,
        data: &Value,
        initialization_path: Option<&str>,
        parent: Option<WeakEntity>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let me: WeakEntity = this.clone();
            let payload = Payload::new(server, data, me);
            let key = F::read_key(&payload);
            let fields = F::load(&payload);
            let extras = payload.into_unread();
            Self {
                core: EntityCore::new(
                    server.clone(),
                    key,
                    initialization_path,
                    parent,
                    extras,
                ),
                this: this.clone(),
                fields: RwLock::new(fields),
            }
        })
    }

    /// Read access to the typed fields. Do not hold across an `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, F> {
        self.fields.read()
    }

    /// Upgraded handle to this node.
    pub fn handle(&self) -> Option<Arc<Self>> {
        self.this.upgrade()
    }

    /// Weak handle usable as the parent of child nodes.
    pub fn downgrade(&self) -> WeakEntity {
        self.this.clone()
    }

    /// Details path built with call-site flag overrides.
    pub fn details_path_with(&self, options: &DetailsOptions) -> Option<String> {
        match F::LISTING {
            Some(listing) if !self.core.key().is_empty() => Some(listing.to_string()),
            _ => partial::details_path(self.core.key(), F::INCLUDES, F::EXCLUDES, options),
        }
    }

    /// Reload from the details path built with `options`.
    pub async fn reload_with(&self, options: &DetailsOptions) -> Result<()> {
        let path = self.resolve_reload_path(self.details_path_with(options))?;
        self.reload_at(&path).await
    }

    /// Upgrade a partial object before reading a field the abbreviated
    /// listing shape does not carry. No-op when already full or when auto
    /// reload is disabled.
    pub async fn ensure_full(&self) -> Result<()> {
        if self.core.auto_reload() && !self.is_full_object() {
            self.reload().await?;
        }
        Ok(())
    }

    /// The parent, if alive and of variant `P`.
    pub fn parent_as<P: Fields>(&self) -> Option<Arc<Node<P>>> {
        self.core.parent().and_then(|parent| downcast::<P>(parent).ok())
    }

    /// True only when the parent is alive and of variant `P`.
    pub fn is_child_of<P: Fields>(&self) -> bool {
        self.core.is_child_of::<Node<P>>()
    }

    /// `DELETE key` on the server.
    pub async fn delete(&self) -> Result<()> {
        let key = self.required_key("delete")?;
        self.core
            .server()
            .query(QueryRequest::new(key, Method::Delete))
            .await?;
        Ok(())
    }

    /// Ask the server to refresh this item's metadata (`PUT key/refresh`).
    pub async fn refresh(&self) -> Result<()> {
        let key = self.required_key("refresh")?;
        self.core
            .server()
            .query(QueryRequest::new(format!("{key}/refresh"), Method::Put))
            .await?;
        Ok(())
    }

    fn required_key(&self, operation: &str) -> Result<&str> {
        match self.core.key() {
            "" => Err(Error::Unsupported(format!(
                "cannot {operation} an object without a key"
            ))),
            key => Ok(key),
        }
    }

    fn resolve_reload_path(&self, details: Option<String>) -> Result<String> {
        details
            .filter(|path| !path.is_empty())
            .or_else(|| Some(self.core.key().to_string()).filter(|key| !key.is_empty()))
            .ok_or_else(|| {
                Error::Unsupported("cannot reload an object not built from a URL".to_string())
            })
    }

    async fn reload_at(&self, path: &str) -> Result<()> {
        debug!(key = %self.core.key(), path, tag = F::TAG, "reloading entity");
        let response = self.core.server().query(QueryRequest::get(path)).await?;
        let item = self.select_item(&response, path)?;
        if !item.is_object() {
            warn!(key = %self.core.key(), path, "reload response carried no item, fields cleared");
        }
        self.repopulate(item, path);
        Ok(())
    }

    /// The fragment of a reload response describing this node.
    fn select_item<'v>(&self, response: &'v Value, path: &str) -> Result<&'v Value> {
        if F::LISTING.is_none() {
            return Ok(envelope::primary_item(response, F::TAG));
        }
        let key = self.core.key();
        envelope::collection(response, F::TAG)
            .into_iter()
            .find(|item| {
                let payload = Payload::new(self.core.server(), item, self.downgrade());
                F::read_key(&payload) == key
            })
            .ok_or_else(|| Error::NotFound(format!("no {} element at {path} with key {key}", F::TAG)))
    }

    /// Re-run population against `data`, mutating this instance.
    ///
    /// Concurrent reloads of the same node are not serialized: whichever
    /// response lands last wins.
    fn repopulate(&self, data: &Value, path: &str) {
        let payload = Payload::new(self.core.server(), data, self.downgrade());
        payload.mark_read("key");
        let fields = F::load(&payload);
        let extras = payload.into_unread();

        *self.fields.write() = fields;
        self.core.replace_extras(extras);
        self.core.set_initialization_path(path);
    }
}

#[async_trait]
impl<F: Fields> Entity for Node<F> {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn tag(&self) -> &'static str {
        F::TAG
    }

    fn entity_type(&self) -> Option<&'static str> {
        F::TYPE
    }

    fn field(&self, name: &str) -> Option<Value> {
        if name == "key" {
            return Some(Value::from(self.core.key()));
        }
        self.fields
            .read()
            .field(name)
            .or_else(|| self.core.extra(name))
    }

    fn details_path(&self) -> Option<String> {
        self.details_path_with(&DetailsOptions::default())
    }

    async fn reload(&self) -> Result<()> {
        let path = self.resolve_reload_path(self.details_path())?;
        self.reload_at(&path).await
    }

    async fn reload_from(&self, path: &str) -> Result<()> {
        let path = self.resolve_reload_path(Some(path.to_string()))?;
        self.reload_at(&path).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<F: Fields> FieldSource for Node<F> {
    fn read_field(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.field(name).map(Cow::Owned)
    }
}

/// Recover the concrete variant of a dynamically built node.
pub fn downcast<F: Fields>(entity: EntityRef) -> std::result::Result<Arc<Node<F>>, EntityRef> {
    if !entity.as_any().is::<Node<F>>() {
        return Err(entity);
    }
    entity
        .clone()
        .into_any()
        .downcast::<Node<F>>()
        .map_err(|_| entity)
}
