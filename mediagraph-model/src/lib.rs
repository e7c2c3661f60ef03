//! Concrete node variants of the media catalog.
//!
//! Each variant is a [`Fields`](mediagraph_core::Fields) layout plus an
//! extension trait carrying its lazy, network-backed accessors. Register
//! them all with [`registry()`] to let the `*_dyn` fetchers dispatch on the
//! payload `type`.
#![allow(missing_docs)]

pub mod flags;
pub mod markers;
pub mod media;
pub mod movie;
pub mod registry;
pub mod section;
pub mod show;
mod values;

pub use markers::{Chapter, Marker};
pub use media::{Media, Part};
pub use movie::{Movie, MovieExt};
pub use registry::{register, registry};
pub use section::{LibraryExt, LibrarySection, SECTIONS_PATH, SectionExt};
pub use show::{Episode, EpisodeExt, Season, SeasonExt, Show, ShowExt};

/// Everything needed to browse a catalog with typed nodes.
pub mod prelude {
    pub use super::markers::{Chapter, Marker};
    pub use super::media::{Media, Part};
    pub use super::movie::{Movie, MovieExt};
    pub use super::section::{LibraryExt, LibrarySection, SectionExt};
    pub use super::show::{Episode, EpisodeExt, Season, SeasonExt, Show, ShowExt};
}
