use mediagraph_core::Registry;

use crate::markers::{Chapter, Marker};
use crate::media::{Media, Part};
use crate::movie::Movie;
use crate::section::LibrarySection;
use crate::show::{Episode, Season, Show};

/// Add every variant of this crate to `registry`.
pub fn register(registry: &mut Registry) {
    registry
        .register::<Movie>()
        .register::<Show>()
        .register::<Season>()
        .register::<Episode>()
        .register::<LibrarySection>()
        .register::<Media>()
        .register::<Part>()
        .register::<Marker>()
        .register::<Chapter>();
}

/// A registry holding every catalog variant.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    register(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_tag_and_type() {
        let registry = registry();
        assert_eq!(registry.len(), 9);
        assert!(registry.contains("Metadata", Some("movie")));
        assert!(registry.contains("Metadata", Some("episode")));
        assert!(registry.contains("Directory", None));
        assert!(registry.lookup("Directory", Some("show")).is_some());
        assert!(registry.lookup("Metadata", Some("artist")).is_none());
        assert!(registry.lookup("Marker", Some("intro")).is_some());
    }
}
