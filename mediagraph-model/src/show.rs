//! Shows, seasons and episodes.
//!
//! Show and season listings point `key` at their children listing
//! (`/library/metadata/1/children`); the suffix is stripped on construction
//! so the key names the item itself.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mediagraph_core::prelude::*;
use serde_json::Value;

use crate::flags::{VIDEO_EXCLUDES, VIDEO_INCLUDES};
use crate::markers::{Chapter, Marker};
use crate::media::{self, Media};
use crate::section::{LibrarySection, owning_section};
use crate::values::{day, elements, epoch, float, int, text};

const CHILDREN_SUFFIX: &str = "/children";

fn item_key(payload: &Payload<'_>) -> String {
    let key = payload.string("key").unwrap_or_default();
    match key.strip_suffix(CHILDREN_SUFFIX) {
        Some(item) => item.to_string(),
        None => key,
    }
}

/// `s01e05`-style label. Unknown numbers render as `?`.
pub fn season_episode_label(season: Option<i64>, episode: Option<i64>) -> String {
    let part = |n: Option<i64>| n.map_or_else(|| "?".to_string(), |n| format!("{n:02}"));
    format!("s{}e{}", part(season), part(episode))
}

#[derive(Debug, Default)]
pub struct Show {
    pub rating_key: Option<i64>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub title_sort: Option<String>,
    pub summary: Option<String>,
    pub studio: Option<String>,
    pub content_rating: Option<String>,
    pub year: Option<i64>,
    pub duration: Option<i64>,
    pub rating: Option<f64>,
    pub child_count: Option<i64>,
    pub leaf_count: Option<i64>,
    pub viewed_leaf_count: Option<i64>,
    pub library_section_id: Option<i64>,
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub originally_available_at: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub roles: Vec<String>,
}

impl Show {
    /// Every episode has been watched.
    pub fn is_watched(&self) -> bool {
        matches!(
            (self.leaf_count, self.viewed_leaf_count),
            (Some(total), Some(viewed)) if total > 0 && viewed >= total
        )
    }
}

impl Fields for Show {
    const TYPE: Option<&'static str> = Some("show");
    const INCLUDES: &'static [(&'static str, Flag)] = VIDEO_INCLUDES;
    const EXCLUDES: &'static [&'static str] = VIDEO_EXCLUDES;

    fn read_key(payload: &Payload<'_>) -> String {
        item_key(payload)
    }

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            rating_key: payload.int("ratingKey"),
            guid: payload.string("guid"),
            title: payload.string("title"),
            title_sort: payload.string("titleSort"),
            summary: payload.string("summary"),
            studio: payload.string("studio"),
            content_rating: payload.string("contentRating"),
            year: payload.int("year"),
            duration: payload.int("duration"),
            rating: payload.float("rating"),
            child_count: payload.int("childCount"),
            leaf_count: payload.int("leafCount"),
            viewed_leaf_count: payload.int("viewedLeafCount"),
            library_section_id: payload.int("librarySectionID"),
            added_at: payload.timestamp("addedAt"),
            updated_at: payload.timestamp("updatedAt"),
            originally_available_at: payload.date("originallyAvailableAt"),
            genres: payload.tags("Genre"),
            roles: payload.tags("Role"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ratingKey" => int(self.rating_key),
            "guid" => text(&self.guid),
            "title" => text(&self.title),
            "titleSort" => text(&self.title_sort),
            "summary" => text(&self.summary),
            "studio" => text(&self.studio),
            "contentRating" => text(&self.content_rating),
            "year" => int(self.year),
            "duration" => int(self.duration),
            "rating" => float(self.rating),
            "childCount" => int(self.child_count),
            "leafCount" => int(self.leaf_count),
            "viewedLeafCount" => int(self.viewed_leaf_count),
            "librarySectionID" => int(self.library_section_id),
            "addedAt" => epoch(self.added_at),
            "updatedAt" => epoch(self.updated_at),
            "originallyAvailableAt" => day(self.originally_available_at),
            "Genre" => elements("tag", &self.genres),
            "Role" => elements("tag", &self.roles),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ShowExt {
    async fn seasons(&self, filter: &Filter) -> Result<Vec<Arc<Node<Season>>>>;

    /// Season by number, e.g. `0` for specials.
    async fn season(&self, index: i64) -> Result<Arc<Node<Season>>>;

    /// Every episode across all seasons.
    async fn episodes(&self, filter: &Filter) -> Result<Vec<Arc<Node<Episode>>>>;

    async fn episode(&self, season: i64, episode: i64) -> Result<Arc<Node<Episode>>>;

    async fn roles(&self) -> Result<Vec<String>>;

    async fn section(&self) -> Result<Arc<Node<LibrarySection>>>;
}

#[async_trait]
impl ShowExt for Node<Show> {
    async fn seasons(&self, filter: &Filter) -> Result<Vec<Arc<Node<Season>>>> {
        let path = format!("{}{CHILDREN_SUFFIX}", self.key());
        self.core()
            .server()
            .fetch_items::<Season>(&path, filter, Some(self.downgrade()))
            .await
    }

    async fn season(&self, index: i64) -> Result<Arc<Node<Season>>> {
        let mut seasons = self.seasons(&Filter::new().with("index", index)).await?;
        if seasons.is_empty() {
            return Err(Error::NotFound(format!(
                "no season {index} under {}",
                self.key()
            )));
        }
        Ok(seasons.swap_remove(0))
    }

    async fn episodes(&self, filter: &Filter) -> Result<Vec<Arc<Node<Episode>>>> {
        let path = format!("{}/allLeaves", self.key());
        self.core()
            .server()
            .fetch_items::<Episode>(&path, filter, None)
            .await
    }

    async fn episode(&self, season: i64, episode: i64) -> Result<Arc<Node<Episode>>> {
        let path = format!("{}/allLeaves", self.key());
        let filter = Filter::new()
            .with("parentIndex", season)
            .with("index", episode);
        self.core().server().fetch_item::<Episode>(path, &filter).await
    }

    async fn roles(&self) -> Result<Vec<String>> {
        self.ensure_full().await?;
        Ok(self.read().roles.clone())
    }

    async fn section(&self) -> Result<Arc<Node<LibrarySection>>> {
        let id = self.read().library_section_id;
        owning_section(self, id).await
    }
}

#[derive(Debug, Default)]
pub struct Season {
    pub rating_key: Option<i64>,
    pub title: Option<String>,
    pub index: Option<i64>,
    pub summary: Option<String>,
    pub parent_key: Option<String>,
    pub parent_title: Option<String>,
    pub leaf_count: Option<i64>,
    pub viewed_leaf_count: Option<i64>,
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Fields for Season {
    const TYPE: Option<&'static str> = Some("season");
    const INCLUDES: &'static [(&'static str, Flag)] = VIDEO_INCLUDES;
    const EXCLUDES: &'static [&'static str] = VIDEO_EXCLUDES;

    fn read_key(payload: &Payload<'_>) -> String {
        item_key(payload)
    }

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            rating_key: payload.int("ratingKey"),
            title: payload.string("title"),
            index: payload.int("index"),
            summary: payload.string("summary"),
            parent_key: payload.string("parentKey"),
            parent_title: payload.string("parentTitle"),
            leaf_count: payload.int("leafCount"),
            viewed_leaf_count: payload.int("viewedLeafCount"),
            added_at: payload.timestamp("addedAt"),
            updated_at: payload.timestamp("updatedAt"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ratingKey" => int(self.rating_key),
            "title" => text(&self.title),
            "index" => int(self.index),
            "summary" => text(&self.summary),
            "parentKey" => text(&self.parent_key),
            "parentTitle" => text(&self.parent_title),
            "leafCount" => int(self.leaf_count),
            "viewedLeafCount" => int(self.viewed_leaf_count),
            "addedAt" => epoch(self.added_at),
            "updatedAt" => epoch(self.updated_at),
            _ => None,
        }
    }
}

#[async_trait]
pub trait SeasonExt {
    async fn episodes(&self, filter: &Filter) -> Result<Vec<Arc<Node<Episode>>>>;

    async fn episode(&self, index: i64) -> Result<Arc<Node<Episode>>>;

    /// The owning show: the live parent if there is one, else fetched.
    async fn show(&self) -> Result<Arc<Node<Show>>>;
}

#[async_trait]
impl SeasonExt for Node<Season> {
    async fn episodes(&self, filter: &Filter) -> Result<Vec<Arc<Node<Episode>>>> {
        let path = format!("{}{CHILDREN_SUFFIX}", self.key());
        self.core()
            .server()
            .fetch_items::<Episode>(&path, filter, Some(self.downgrade()))
            .await
    }

    async fn episode(&self, index: i64) -> Result<Arc<Node<Episode>>> {
        let path = format!("{}{CHILDREN_SUFFIX}", self.key());
        self.core()
            .server()
            .fetch_item::<Episode>(path, &Filter::new().with("index", index))
            .await
    }

    async fn show(&self) -> Result<Arc<Node<Show>>> {
        if let Some(show) = self.parent_as::<Show>() {
            return Ok(show);
        }
        let parent_key = self.read().parent_key.clone();
        fetch_related::<Show>(self.core().server(), parent_key, self.key()).await
    }
}

#[derive(Debug, Default)]
pub struct Episode {
    pub rating_key: Option<i64>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub index: Option<i64>,
    pub parent_index: Option<i64>,
    pub parent_key: Option<String>,
    pub parent_title: Option<String>,
    pub grandparent_key: Option<String>,
    pub grandparent_title: Option<String>,
    pub content_rating: Option<String>,
    pub duration: Option<i64>,
    pub view_count: Option<i64>,
    pub view_offset: Option<i64>,
    pub library_section_id: Option<i64>,
    pub added_at: Option<DateTime<Utc>>,
    pub originally_available_at: Option<NaiveDate>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub media: Vec<Arc<Node<Media>>>,
    pub markers: Vec<Arc<Node<Marker>>>,
    pub chapters: Vec<Arc<Node<Chapter>>>,
}

impl Episode {
    pub fn season_episode(&self) -> String {
        season_episode_label(self.parent_index, self.index)
    }

    pub fn is_watched(&self) -> bool {
        self.view_count.is_some_and(|count| count > 0)
    }

    pub fn locations(&self) -> Vec<String> {
        media::files(&self.media)
    }
}

impl Fields for Episode {
    const TYPE: Option<&'static str> = Some("episode");
    const INCLUDES: &'static [(&'static str, Flag)] = VIDEO_INCLUDES;
    const EXCLUDES: &'static [&'static str] = VIDEO_EXCLUDES;

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            rating_key: payload.int("ratingKey"),
            guid: payload.string("guid"),
            title: payload.string("title"),
            summary: payload.string("summary"),
            index: payload.int("index"),
            parent_index: payload.int("parentIndex"),
            parent_key: payload.string("parentKey"),
            parent_title: payload.string("parentTitle"),
            grandparent_key: payload.string("grandparentKey"),
            grandparent_title: payload.string("grandparentTitle"),
            content_rating: payload.string("contentRating"),
            duration: payload.int("duration"),
            view_count: payload.int("viewCount"),
            view_offset: payload.int("viewOffset"),
            library_section_id: payload.int("librarySectionID"),
            added_at: payload.timestamp("addedAt"),
            originally_available_at: payload.date("originallyAvailableAt"),
            directors: payload.tags("Director"),
            writers: payload.tags("Writer"),
            media: payload.children::<Media>(),
            markers: payload.children::<Marker>(),
            chapters: payload.children::<Chapter>(),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ratingKey" => int(self.rating_key),
            "guid" => text(&self.guid),
            "title" => text(&self.title),
            "summary" => text(&self.summary),
            "index" => int(self.index),
            "parentIndex" => int(self.parent_index),
            "parentKey" => text(&self.parent_key),
            "parentTitle" => text(&self.parent_title),
            "grandparentKey" => text(&self.grandparent_key),
            "grandparentTitle" => text(&self.grandparent_title),
            "contentRating" => text(&self.content_rating),
            "duration" => int(self.duration),
            "viewCount" => int(self.view_count),
            "viewOffset" => int(self.view_offset),
            "librarySectionID" => int(self.library_section_id),
            "addedAt" => epoch(self.added_at),
            "originallyAvailableAt" => day(self.originally_available_at),
            "Director" => elements("tag", &self.directors),
            "Writer" => elements("tag", &self.writers),
            _ => None,
        }
    }
}

#[async_trait]
pub trait EpisodeExt {
    async fn markers(&self) -> Result<Vec<Arc<Node<Marker>>>>;

    async fn chapters(&self) -> Result<Vec<Arc<Node<Chapter>>>>;

    /// The owning season: the live parent if there is one, else fetched.
    async fn season(&self) -> Result<Arc<Node<Season>>>;

    async fn show(&self) -> Result<Arc<Node<Show>>>;

    async fn section(&self) -> Result<Arc<Node<LibrarySection>>>;
}

#[async_trait]
impl EpisodeExt for Node<Episode> {
    async fn markers(&self) -> Result<Vec<Arc<Node<Marker>>>> {
        self.ensure_full().await?;
        Ok(self.read().markers.clone())
    }

    async fn chapters(&self) -> Result<Vec<Arc<Node<Chapter>>>> {
        self.ensure_full().await?;
        Ok(self.read().chapters.clone())
    }

    async fn season(&self) -> Result<Arc<Node<Season>>> {
        if let Some(season) = self.parent_as::<Season>() {
            return Ok(season);
        }
        let parent_key = self.read().parent_key.clone();
        fetch_related::<Season>(self.core().server(), parent_key, self.key()).await
    }

    async fn show(&self) -> Result<Arc<Node<Show>>> {
        if let Some(show) = self.parent_as::<Season>().and_then(|season| season.parent_as::<Show>()) {
            return Ok(show);
        }
        let grandparent_key = self.read().grandparent_key.clone();
        fetch_related::<Show>(self.core().server(), grandparent_key, self.key()).await
    }

    async fn section(&self) -> Result<Arc<Node<LibrarySection>>> {
        let id = self.read().library_section_id;
        owning_section(self, id).await
    }
}

async fn fetch_related<F: Fields>(
    server: &Server,
    key: Option<String>,
    from: &str,
) -> Result<Arc<Node<F>>> {
    let key = key.filter(|key| !key.is_empty()).ok_or_else(|| {
        Error::NotFound(format!("{from} does not reference its {}", F::TYPE.unwrap_or(F::TAG)))
    })?;
    server.fetch_item::<F>(key, &Filter::new()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_episode_labels_are_zero_padded() {
        assert_eq!(season_episode_label(Some(1), Some(5)), "s01e05");
        assert_eq!(season_episode_label(Some(12), Some(103)), "s12e103");
        assert_eq!(season_episode_label(None, Some(2)), "s?e02");
    }

    #[test]
    fn show_watched_needs_every_leaf() {
        let show = Show {
            leaf_count: Some(10),
            viewed_leaf_count: Some(10),
            ..Show::default()
        };
        assert!(show.is_watched());

        let partway = Show {
            leaf_count: Some(10),
            viewed_leaf_count: Some(3),
            ..Show::default()
        };
        assert!(!partway.is_watched());
        assert!(!Show::default().is_watched());
    }
}
