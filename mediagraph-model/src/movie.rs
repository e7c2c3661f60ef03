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

/// A movie. Listings carry the scalar attributes and a trimmed set of tags;
/// markers, chapters and cast only arrive with the detail response.
#[derive(Debug, Default)]
pub struct Movie {
    pub rating_key: Option<i64>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub title_sort: Option<String>,
    pub original_title: Option<String>,
    pub summary: Option<String>,
    pub tagline: Option<String>,
    pub studio: Option<String>,
    pub content_rating: Option<String>,
    pub year: Option<i64>,
    pub duration: Option<i64>,
    pub rating: Option<f64>,
    pub audience_rating: Option<f64>,
    pub view_count: Option<i64>,
    pub view_offset: Option<i64>,
    pub library_section_id: Option<i64>,
    pub added_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub originally_available_at: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub countries: Vec<String>,
    pub roles: Vec<String>,
    pub media: Vec<Arc<Node<Media>>>,
    pub markers: Vec<Arc<Node<Marker>>>,
    pub chapters: Vec<Arc<Node<Chapter>>>,
}

impl Movie {
    pub fn is_watched(&self) -> bool {
        self.view_count.is_some_and(|count| count > 0)
    }

    /// File paths of every media part.
    pub fn locations(&self) -> Vec<String> {
        media::files(&self.media)
    }
}

impl Fields for Movie {
    const TYPE: Option<&'static str> = Some("movie");
    const INCLUDES: &'static [(&'static str, Flag)] = VIDEO_INCLUDES;
    const EXCLUDES: &'static [&'static str] = VIDEO_EXCLUDES;

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            rating_key: payload.int("ratingKey"),
            guid: payload.string("guid"),
            title: payload.string("title"),
            title_sort: payload.string("titleSort"),
            original_title: payload.string("originalTitle"),
            summary: payload.string("summary"),
            tagline: payload.string("tagline"),
            studio: payload.string("studio"),
            content_rating: payload.string("contentRating"),
            year: payload.int("year"),
            duration: payload.int("duration"),
            rating: payload.float("rating"),
            audience_rating: payload.float("audienceRating"),
            view_count: payload.int("viewCount"),
            view_offset: payload.int("viewOffset"),
            library_section_id: payload.int("librarySectionID"),
            added_at: payload.timestamp("addedAt"),
            updated_at: payload.timestamp("updatedAt"),
            last_viewed_at: payload.timestamp("lastViewedAt"),
            originally_available_at: payload.date("originallyAvailableAt"),
            genres: payload.tags("Genre"),
            directors: payload.tags("Director"),
            writers: payload.tags("Writer"),
            countries: payload.tags("Country"),
            roles: payload.tags("Role"),
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
            "titleSort" => text(&self.title_sort),
            "originalTitle" => text(&self.original_title),
            "summary" => text(&self.summary),
            "tagline" => text(&self.tagline),
            "studio" => text(&self.studio),
            "contentRating" => text(&self.content_rating),
            "year" => int(self.year),
            "duration" => int(self.duration),
            "rating" => float(self.rating),
            "audienceRating" => float(self.audience_rating),
            "viewCount" => int(self.view_count),
            "viewOffset" => int(self.view_offset),
            "librarySectionID" => int(self.library_section_id),
            "addedAt" => epoch(self.added_at),
            "updatedAt" => epoch(self.updated_at),
            "lastViewedAt" => epoch(self.last_viewed_at),
            "originallyAvailableAt" => day(self.originally_available_at),
            "Genre" => elements("tag", &self.genres),
            "Director" => elements("tag", &self.directors),
            "Writer" => elements("tag", &self.writers),
            "Country" => elements("tag", &self.countries),
            "Role" => elements("tag", &self.roles),
            _ => None,
        }
    }
}

/// Accessors that may need the detail response.
#[async_trait]
pub trait MovieExt {
    async fn markers(&self) -> Result<Vec<Arc<Node<Marker>>>>;

    async fn chapters(&self) -> Result<Vec<Arc<Node<Chapter>>>>;

    /// Cast names; listings leave `Role` out entirely.
    async fn roles(&self) -> Result<Vec<String>>;

    async fn genres(&self) -> Result<Vec<String>>;

    async fn section(&self) -> Result<Arc<Node<LibrarySection>>>;
}

#[async_trait]
impl MovieExt for Node<Movie> {
    async fn markers(&self) -> Result<Vec<Arc<Node<Marker>>>> {
        self.ensure_full().await?;
        Ok(self.read().markers.clone())
    }

    async fn chapters(&self) -> Result<Vec<Arc<Node<Chapter>>>> {
        self.ensure_full().await?;
        Ok(self.read().chapters.clone())
    }

    async fn roles(&self) -> Result<Vec<String>> {
        self.ensure_full().await?;
        Ok(self.read().roles.clone())
    }

    async fn genres(&self) -> Result<Vec<String>> {
        self.ensure_full().await?;
        Ok(self.read().genres.clone())
    }

    async fn section(&self) -> Result<Arc<Node<LibrarySection>>> {
        let id = self.read().library_section_id;
        owning_section(self, id).await
    }
}
