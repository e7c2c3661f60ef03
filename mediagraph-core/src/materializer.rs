//! Selecting, filtering and constructing nodes from response payloads.
//!
//! All fetchers share one mechanism: query a path, pick the sub-collection
//! named by the target variant's tag, keep the fragments that pass the
//! filter (in source order) and construct them. [`find_items`] is the
//! network-free primitive underneath.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::entity::{EntityRef, Fields, Node, WeakEntity};
use crate::envelope::{self, DEFAULT_TAG};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::operator::loose_eq;
use crate::server::Server;
use crate::transport::QueryRequest;

/// Path prefix numeric item keys expand under.
pub const METADATA_PREFIX: &str = "/library/metadata";

/// Header carrying the offset of a paged listing request.
pub const CONTAINER_START_HEADER: &str = "X-Plex-Container-Start";

/// Header carrying the page size of a paged listing request.
pub const CONTAINER_SIZE_HEADER: &str = "X-Plex-Container-Size";

/// A server-relative path or a numeric item identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    Path(String),
    Id(u64),
}

impl ItemKey {
    /// Resolve to a path. Numeric ids and all-digit strings expand to
    /// `/library/metadata/<id>`.
    pub fn into_path(self) -> String {
        match self {
            ItemKey::Id(id) => format!("{METADATA_PREFIX}/{id}"),
            ItemKey::Path(path)
                if !path.is_empty() && path.bytes().all(|b| b.is_ascii_digit()) =>
            {
                format!("{METADATA_PREFIX}/{path}")
            }
            ItemKey::Path(path) => path,
        }
    }
}

impl From<u64> for ItemKey {
    fn from(id: u64) -> Self {
        ItemKey::Id(id)
    }
}

impl From<u32> for ItemKey {
    fn from(id: u32) -> Self {
        ItemKey::Id(u64::from(id))
    }
}

impl From<&str> for ItemKey {
    fn from(path: &str) -> Self {
        ItemKey::Path(path.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(path: String) -> Self {
        ItemKey::Path(path)
    }
}

impl From<&String> for ItemKey {
    fn from(path: &String) -> Self {
        ItemKey::Path(path.clone())
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Path(path) => f.write_str(path),
            ItemKey::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Paging for [`Server::fetch_items_paged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_size: usize,
    pub max_results: Option<usize>,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_results: None,
        }
    }
}

/// Whether a fragment passes `filter` for variant `F`.
///
/// A typed variant implicitly requires its `type` unless the caller already
/// filters on `type`; fragments without a `type` attribute are not excluded.
pub fn accepts<F: Fields>(fragment: &Value, filter: &Filter) -> bool {
    if let Some(expected) = F::TYPE
        && !filter.constrains("type")
        && let Some(actual) = fragment.get("type")
        && !loose_eq(actual, &Value::from(expected))
    {
        return false;
    }
    filter.matches(fragment)
}

/// Fragments of `items` passing `filter`, in source order.
pub fn find_items_raw<'v>(
    items: impl IntoIterator<Item = &'v Value>,
    filter: &Filter,
) -> Vec<&'v Value> {
    items
        .into_iter()
        .filter(|item| {
            let keep = filter.matches(*item);
            if !keep {
                trace!(key = ?item.get("key"), "fragment rejected by filter");
            }
            keep
        })
        .collect()
}

/// Construct every fragment of `items` passing `filter` as variant `F`.
///
/// No network access. Each node is built without an explicit
/// initialization path, so it starts out initialized from its own key.
pub fn find_items<'v, F: Fields>(
    items: impl IntoIterator<Item = &'v Value>,
    filter: &Filter,
    server: &Server,
    parent: Option<WeakEntity>,
) -> Vec<Arc<Node<F>>> {
    construct::<F>(items, filter, server, None, parent)
}

fn construct<'v, F: Fields>(
    items: impl IntoIterator<Item = &'v Value>,
    filter: &Filter,
    server: &Server,
    initialization_path: Option<&str>,
    parent: Option<WeakEntity>,
) -> Vec<Arc<Node<F>>> {
    items
        .into_iter()
        .filter(|item| accepts::<F>(item, filter))
        .map(|item| Node::<F>::build(server, item, initialization_path, parent.clone()))
        .collect()
}

impl Server {
    /// Fetch one item and construct it as `F`.
    ///
    /// The fetched path becomes the node's initialization path, so fetching
    /// the details path yields a full object. Fails with
    /// [`Error::NotFound`] when no fragment passes.
    pub async fn fetch_item<F: Fields>(
        &self,
        key: impl Into<ItemKey>,
        filter: &Filter,
    ) -> Result<Arc<Node<F>>> {
        let path = required_path(key.into())?;
        let response = self.get(&path).await?;
        let fragments = envelope::collection(&response, F::TAG);
        debug!(path = %path, tag = F::TAG, candidates = fragments.len(), "fetch_item");

        fragments
            .into_iter()
            .find(|item| accepts::<F>(item, filter))
            .map(|item| Node::<F>::build(self, item, Some(path.as_str()), None))
            .ok_or_else(|| not_found(&path, F::TAG, filter))
    }

    /// Fetch one raw fragment from the `Metadata` sub-collection.
    pub async fn fetch_item_raw(&self, key: impl Into<ItemKey>, filter: &Filter) -> Result<Value> {
        let path = required_path(key.into())?;
        let response = self.get(&path).await?;
        envelope::collection(&response, DEFAULT_TAG)
            .into_iter()
            .find(|item| filter.matches(*item))
            .cloned()
            .ok_or_else(|| not_found(&path, DEFAULT_TAG, filter))
    }

    /// Fetch one item and build it through the registry.
    pub async fn fetch_item_dyn(
        &self,
        key: impl Into<ItemKey>,
        tag: Option<&str>,
        filter: &Filter,
    ) -> Result<EntityRef> {
        let path = required_path(key.into())?;
        let tag = tag.unwrap_or(DEFAULT_TAG);
        let response = self.get(&path).await?;
        envelope::collection(&response, tag)
            .into_iter()
            .filter(|item| filter.matches(*item))
            .find_map(|item| self.registry().build(self, tag, item, Some(path.as_str()), None))
            .ok_or_else(|| not_found(&path, tag, filter))
    }

    /// Fetch a listing and construct every passing fragment as `F`.
    ///
    /// Nodes fetched from their variant's own [`Fields::LISTING`] are
    /// initialized from it and so start out full.
    pub async fn fetch_items<F: Fields>(
        &self,
        path: &str,
        filter: &Filter,
        parent: Option<WeakEntity>,
    ) -> Result<Vec<Arc<Node<F>>>> {
        let response = self.get(path).await?;
        let fragments = envelope::collection(&response, F::TAG);
        let total = fragments.len();
        let initialization_path = (F::LISTING == Some(path)).then_some(path);
        let items = construct::<F>(fragments, filter, self, initialization_path, parent);
        debug!(path, tag = F::TAG, total, matched = items.len(), "fetch_items");
        Ok(items)
    }

    /// Fetch a listing and return the passing raw fragments of `tag`
    /// (default `Metadata`).
    pub async fn fetch_items_raw(
        &self,
        path: &str,
        tag: Option<&str>,
        filter: &Filter,
    ) -> Result<Vec<Value>> {
        let response = self.get(path).await?;
        let fragments = envelope::collection(&response, tag.unwrap_or(DEFAULT_TAG));
        Ok(find_items_raw(fragments, filter).into_iter().cloned().collect())
    }

    /// Fetch a listing and build each passing fragment through the
    /// registry. Fragments with no registered variant are skipped.
    pub async fn fetch_items_dyn(
        &self,
        path: &str,
        tag: Option<&str>,
        filter: &Filter,
        parent: Option<WeakEntity>,
    ) -> Result<Vec<EntityRef>> {
        let tag = tag.unwrap_or(DEFAULT_TAG);
        let response = self.get(path).await?;
        let fragments = envelope::collection(&response, tag);
        let items = find_items_raw(fragments, filter)
            .into_iter()
            .filter_map(|item| {
                let built = self.registry().build(self, tag, item, None, parent.clone());
                if built.is_none() {
                    warn!(tag, kind = ?item.get("type"), "no registered variant, skipping fragment");
                }
                built
            })
            .collect();
        Ok(items)
    }

    /// Fetch a listing page by page.
    ///
    /// Stops once the container's `totalSize` is reached, a page comes back
    /// empty or short, or `max_results` items have passed the filter.
    pub async fn fetch_items_paged<F: Fields>(
        &self,
        path: &str,
        filter: &Filter,
        paging: Paging,
        parent: Option<WeakEntity>,
    ) -> Result<Vec<Arc<Node<F>>>> {
        let page_size = paging.page_size.max(1);
        let mut results = Vec::new();
        let mut start = 0usize;

        loop {
            let request = QueryRequest::get(path)
                .header(CONTAINER_START_HEADER, start.to_string())
                .header(CONTAINER_SIZE_HEADER, page_size.to_string());
            let response = self.query(request).await?;
            let fragments = envelope::collection(&response, F::TAG);
            let fetched = fragments.len();
            let total = envelope::container_attr(&response, "totalSize");

            results.extend(find_items::<F>(fragments, filter, self, parent.clone()));
            start += fetched;
            debug!(path, start, fetched, ?total, matched = results.len(), "fetch_items_paged");

            if let Some(max) = paging.max_results
                && results.len() >= max
            {
                results.truncate(max);
                break;
            }
            let exhausted = match total {
                Some(total) => start as u64 >= total,
                None => fetched < page_size,
            };
            if fetched == 0 || exhausted {
                break;
            }
        }
        Ok(results)
    }
}

fn required_path(key: ItemKey) -> Result<String> {
    let path = key.into_path();
    if path.is_empty() {
        return Err(Error::Unsupported("an item key is required".to_string()));
    }
    Ok(path)
}

fn not_found(path: &str, tag: &str, filter: &Filter) -> Error {
    let conditions: Vec<String> = filter.predicates().iter().map(ToString::to_string).collect();
    Error::NotFound(format!(
        "no {tag} element at {path} matching [{}]",
        conditions.join(", ")
    ))
}
