//! Library sections and the catalog root that lists them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediagraph_core::prelude::*;
use mediagraph_core::Paging;
use serde_json::Value;
use tracing::debug;

use crate::values::{elements, epoch, text};

/// Listing of every library section on a server.
pub const SECTIONS_PATH: &str = "/library/sections";

/// A library section such as "Movies" or "TV Shows".
///
/// Section listings carry the numeric id as `key`; it is expanded to the
/// full `/library/sections/<id>` path on construction.
///
/// `/library/sections/<id>` answers with the section's browse endpoints, not
/// the section itself, so sections reload from the sections listing.
#[derive(Debug, Clone, Default)]
pub struct LibrarySection {
    pub uuid: Option<String>,
    pub title: Option<String>,
    pub section_type: Option<String>,
    pub agent: Option<String>,
    pub scanner: Option<String>,
    pub language: Option<String>,
    pub refreshing: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub locations: Vec<String>,
}

impl Fields for LibrarySection {
    const TAG: &'static str = "Directory";
    const LISTING: Option<&'static str> = Some(SECTIONS_PATH);

    fn read_key(payload: &Payload<'_>) -> String {
        section_path(&payload.string("key").unwrap_or_default())
    }

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            uuid: payload.string("uuid"),
            title: payload.string("title"),
            section_type: payload.string("type"),
            agent: payload.string("agent"),
            scanner: payload.string("scanner"),
            language: payload.string("language"),
            refreshing: payload.bool("refreshing"),
            created_at: payload.timestamp("createdAt"),
            updated_at: payload.timestamp("updatedAt"),
            scanned_at: payload.timestamp("scannedAt"),
            locations: payload.pluck("Location", "path"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "uuid" => text(&self.uuid),
            "title" => text(&self.title),
            "type" => text(&self.section_type),
            "agent" => text(&self.agent),
            "scanner" => text(&self.scanner),
            "language" => text(&self.language),
            "refreshing" => self.refreshing.map(Value::from),
            "createdAt" => epoch(self.created_at),
            "updatedAt" => epoch(self.updated_at),
            "scannedAt" => epoch(self.scanned_at),
            "Location" => elements("path", &self.locations),
            _ => None,
        }
    }
}

/// Expand a bare section id to its path; anything else is kept.
pub(crate) fn section_path(key: &str) -> String {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        format!("{SECTIONS_PATH}/{key}")
    } else {
        key.to_string()
    }
}

/// Browsing a section's contents.
#[async_trait]
pub trait SectionExt {
    /// Every item of the section, built through the registry.
    async fn all(&self, filter: &Filter) -> Result<Vec<EntityRef>>;

    /// Items of one variant, parented to the section.
    async fn items<F: Fields>(&self, filter: &Filter) -> Result<Vec<Arc<Node<F>>>>;

    /// Like [`SectionExt::items`], fetched page by page.
    async fn items_paged<F: Fields>(
        &self,
        filter: &Filter,
        paging: Paging,
    ) -> Result<Vec<Arc<Node<F>>>>;

    /// First item whose title matches, ignoring case.
    async fn get(&self, title: &str) -> Result<EntityRef>;

    /// Recently added items, newest first as the server orders them.
    async fn recently_added(&self, filter: &Filter) -> Result<Vec<EntityRef>>;

    /// Ask the server to scan the section's locations for new files.
    async fn scan(&self) -> Result<()>;
}

#[async_trait]
impl SectionExt for Node<LibrarySection> {
    async fn all(&self, filter: &Filter) -> Result<Vec<EntityRef>> {
        let path = format!("{}/all", self.key());
        self.core()
            .server()
            .fetch_items_dyn(&path, None, filter, Some(self.downgrade()))
            .await
    }

    async fn items<F: Fields>(&self, filter: &Filter) -> Result<Vec<Arc<Node<F>>>> {
        let path = format!("{}/all", self.key());
        self.core()
            .server()
            .fetch_items::<F>(&path, filter, Some(self.downgrade()))
            .await
    }

    async fn items_paged<F: Fields>(
        &self,
        filter: &Filter,
        paging: Paging,
    ) -> Result<Vec<Arc<Node<F>>>> {
        let path = format!("{}/all", self.key());
        self.core()
            .server()
            .fetch_items_paged::<F>(&path, filter, paging, Some(self.downgrade()))
            .await
    }

    async fn get(&self, title: &str) -> Result<EntityRef> {
        let path = format!("{}/all", self.key());
        self.core()
            .server()
            .fetch_item_dyn(path, None, &Filter::new().with("title__iexact", title))
            .await
    }

    async fn recently_added(&self, filter: &Filter) -> Result<Vec<EntityRef>> {
        let path = format!("{}/recentlyAdded", self.key());
        self.core()
            .server()
            .fetch_items_dyn(&path, None, filter, Some(self.downgrade()))
            .await
    }

    async fn scan(&self) -> Result<()> {
        let path = format!("{}/refresh", self.key());
        debug!(section = %self.key(), "requesting section scan");
        self.core().server().query(QueryRequest::get(path)).await?;
        Ok(())
    }
}

/// Entry points from a [`Server`] into its library.
#[async_trait]
pub trait LibraryExt {
    async fn sections(&self) -> Result<Vec<Arc<Node<LibrarySection>>>>;

    /// Section with the given title, ignoring case.
    async fn section(&self, title: &str) -> Result<Arc<Node<LibrarySection>>>;

    async fn section_by_id(&self, id: i64) -> Result<Arc<Node<LibrarySection>>>;
}

#[async_trait]
impl LibraryExt for Server {
    async fn sections(&self) -> Result<Vec<Arc<Node<LibrarySection>>>> {
        self.fetch_items::<LibrarySection>(SECTIONS_PATH, &Filter::new(), None)
            .await
    }

    async fn section(&self, title: &str) -> Result<Arc<Node<LibrarySection>>> {
        self.fetch_item::<LibrarySection>(SECTIONS_PATH, &Filter::new().with("title__iexact", title))
            .await
    }

    async fn section_by_id(&self, id: i64) -> Result<Arc<Node<LibrarySection>>> {
        self.fetch_item::<LibrarySection>(SECTIONS_PATH, &Filter::new().with("key", id))
            .await
    }
}

/// The section a node belongs to: its parent when that is a live section,
/// otherwise looked up by the node's `librarySectionID`.
pub(crate) async fn owning_section<F: Fields>(
    node: &Node<F>,
    section_id: Option<i64>,
) -> Result<Arc<Node<LibrarySection>>> {
    if let Some(section) = node.parent_as::<LibrarySection>() {
        return Ok(section);
    }
    let id = section_id.ok_or_else(|| {
        Error::NotFound(format!("{} carries no library section id", node.key()))
    })?;
    node.core().server().section_by_id(id).await
}
