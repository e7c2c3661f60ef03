//! Detail-fetch flags shared by the video variants.

use mediagraph_core::Flag;

/// Inclusion flags sent when upgrading a movie, show, season or episode.
///
/// Flags defaulting to `0` stay off the query string unless a caller turns
/// them on through [`DetailsOptions`](mediagraph_core::DetailsOptions).
pub const VIDEO_INCLUDES: &[(&str, Flag)] = &[
    ("checkFiles", Flag::Int(0)),
    ("includeAllConcerts", Flag::Int(0)),
    ("includeBandwidths", Flag::Int(1)),
    ("includeChapters", Flag::Int(1)),
    ("includeChildren", Flag::Int(0)),
    ("includeConcerts", Flag::Int(0)),
    ("includeExternalMedia", Flag::Int(0)),
    ("includeExtras", Flag::Int(0)),
    ("includeFields", Flag::Str("thumbBlurHash,artBlurHash")),
    ("includeGeolocation", Flag::Int(1)),
    ("includeLoudnessRamps", Flag::Int(1)),
    ("includeMarkers", Flag::Int(1)),
    ("includeOnDeck", Flag::Int(0)),
    ("includePopularLeaves", Flag::Int(0)),
    ("includePreferences", Flag::Int(0)),
    ("includeRelated", Flag::Int(0)),
    ("includeRelatedCount", Flag::Int(0)),
    ("includeReviews", Flag::Int(0)),
    ("includeStations", Flag::Int(0)),
];

/// Parameters that trim a detail response; only sent when supplied.
pub const VIDEO_EXCLUDES: &[&str] = &["excludeElements", "excludeFields", "skipRefresh"];

/// Query string the default flags produce, for assertions and logging.
pub const VIDEO_DETAILS_QUERY: &str = "includeBandwidths=1&includeChapters=1\
&includeFields=thumbBlurHash%2CartBlurHash&includeGeolocation=1\
&includeLoudnessRamps=1&includeMarkers=1";
