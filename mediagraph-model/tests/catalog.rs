mod support;

use mediagraph_core::prelude::*;
use mediagraph_core::{Paging, downcast, envelope, find_items};
use mediagraph_model::flags::VIDEO_DETAILS_QUERY;
use mediagraph_model::prelude::*;
use serde_json::{Value, json};
use support::FakeCatalog;

fn sections() -> Value {
    json!({"MediaContainer": {"size": 2, "Directory": [
        {"key": "1", "title": "Movies", "type": "movie", "agent": "tv.plex.agents.movie",
         "Location": [{"id": 1, "path": "/data/movies"}]},
        {"key": "2", "title": "TV Shows", "type": "show", "scannedAt": 1_700_000_000}
    ]}})
}

fn movie_listing() -> Value {
    json!({"MediaContainer": {"size": 3, "Metadata": [
        {"ratingKey": "7", "key": "/library/metadata/7", "type": "movie", "title": "Heat",
         "year": 1995, "librarySectionID": 1, "Genre": [{"tag": "Crime"}],
         "Media": [{"id": 70, "videoResolution": "1080",
                    "Part": [{"id": 700, "key": "/library/parts/700/file.mkv", "file": "/data/movies/Heat (1995).mkv"}]}]},
        {"ratingKey": "8", "key": "/library/metadata/8", "type": "movie", "title": "Ronin",
         "year": "1998", "librarySectionID": 1,
         "Media": [{"id": 80, "Part": [{"id": 800, "file": "/data/movies/Ronin (1998).mkv"}]}]},
        {"ratingKey": "9", "key": "/library/metadata/9", "type": "movie", "title": "Thief",
         "year": 1981, "librarySectionID": 1}
    ]}})
}

fn heat_details() -> Value {
    json!({"MediaContainer": {"size": 1, "Metadata": [{
        "ratingKey": "7", "key": "/library/metadata/7", "type": "movie", "title": "Heat",
        "year": 1995, "librarySectionID": 1,
        "Genre": [{"tag": "Crime"}, {"tag": "Drama"}, {"tag": "Thriller"}],
        "Role": [{"tag": "Al Pacino"}, {"tag": "Robert De Niro"}],
        "Marker": [
            {"id": 1, "type": "intro", "startTimeOffset": 0, "endTimeOffset": 90_000},
            {"id": 2, "type": "credits", "startTimeOffset": 9_500_000, "endTimeOffset": 10_200_000, "final": true}
        ],
        "Chapter": [{"id": 5, "index": 1, "tag": "Opening", "startTimeOffset": 0, "endTimeOffset": 600_000}]
    }]}})
}

fn details_path(key: &str) -> String {
    format!("{key}?{VIDEO_DETAILS_QUERY}")
}

#[tokio::test]
async fn sections_expand_bare_ids_to_paths() {
    let catalog = FakeCatalog::new();
    catalog.respond("/library/sections", sections());
    let server = catalog.server();

    let sections = server.sections().await.unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].key(), "/library/sections/1");
    assert_eq!(sections[0].read().locations, vec!["/data/movies"]);
    assert_eq!(sections[1].read().section_type.as_deref(), Some("show"));
    assert!(sections[1].read().scanned_at.is_some());
    assert_eq!(sections[0].field("agent"), Some(json!("tv.plex.agents.movie")));

    let shows = server.section("tv shows").await.unwrap();
    assert_eq!(shows.key(), "/library/sections/2");
    let movies = server.section_by_id(1).await.unwrap();
    assert_eq!(movies.read().title.as_deref(), Some("Movies"));
}

#[tokio::test]
async fn section_items_are_filtered_and_parented() {
    let catalog = FakeCatalog::new();
    catalog
        .respond("/library/sections", sections())
        .respond("/library/sections/1/all", movie_listing());
    let server = catalog.server();

    let section = server.section("Movies").await.unwrap();
    let movies = section
        .items::<Movie>(&Filter::new().with("year__gte", 1990))
        .await
        .unwrap();
    let titles: Vec<_> = movies.iter().map(|m| m.read().title.clone().unwrap()).collect();
    assert_eq!(titles, vec!["Heat", "Ronin"]);
    assert_eq!(movies[1].read().year, Some(1998));
    assert!(movies[0].is_child_of::<LibrarySection>());

    let owner = movies[0].section().await.unwrap();
    assert_eq!(owner.key(), section.key());
    assert_eq!(catalog.requests().len(), 2);
}

#[tokio::test]
async fn movie_accessors_upgrade_a_listing_node_once() {
    let details = details_path("/library/metadata/7");
    let catalog = FakeCatalog::new();
    catalog
        .respond("/library/sections/1/all", movie_listing())
        .respond(&details, heat_details());
    let server = catalog.server();

    let heat = server
        .fetch_items::<Movie>("/library/sections/1/all", &Filter::new().with("title", "Heat"), None)
        .await
        .unwrap()
        .remove(0);
    assert!(heat.is_partial_object());
    assert_eq!(heat.details_path().as_deref(), Some(details.as_str()));
    assert_eq!(heat.read().genres, vec!["Crime"]);

    let markers = heat.markers().await.unwrap();
    assert_eq!(markers.len(), 2);
    assert!(markers[0].read().is_intro());
    assert_eq!(markers[1].read().is_final, Some(true));
    assert!(markers[0].is_child_of::<Movie>());

    assert_eq!(heat.roles().await.unwrap(), vec!["Al Pacino", "Robert De Niro"]);
    assert_eq!(heat.genres().await.unwrap().len(), 3);
    assert_eq!(heat.chapters().await.unwrap()[0].read().title.as_deref(), Some("Opening"));
    assert!(heat.is_full_object());
    assert_eq!(catalog.paths(), vec!["/library/sections/1/all".to_string(), details]);
}

#[tokio::test]
async fn media_parts_are_reachable_from_nested_filters() {
    let catalog = FakeCatalog::new();
    catalog.respond("/library/sections/1/all", movie_listing());
    let server = catalog.server();

    let found = server
        .fetch_items::<Movie>(
            "/library/sections/1/all",
            &Filter::new().with("Media__Part__file__istartswith", "/data/movies/ronin"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].read().locations(), vec!["/data/movies/Ronin (1998).mkv"]);

    let heat = server
        .fetch_item::<Movie>("/library/sections/1/all", &Filter::new().with("Genre__tag", "Crime"))
        .await
        .unwrap();
    assert_eq!(heat.read().media[0].read().video_resolution.as_deref(), Some("1080"));
    assert!(Filter::new().with("Genre__tag__iexact", "crime").matches(&*heat));
}

#[test]
fn nested_media_filters_agree_on_fragments_and_nodes() {
    let catalog = FakeCatalog::new();
    let server = catalog.server();
    let listing = movie_listing();
    let fragments = envelope::collection(&listing, "Metadata");
    let movies = find_items::<Movie>(fragments.iter().copied(), &Filter::new(), &server, None);
    assert_eq!(movies.len(), 3);

    let filters = [
        Filter::new().with("Media__Part__file__endswith", ".mkv"),
        Filter::new().with("Media__videoResolution", "1080"),
        Filter::new().with("Media__Part__id__gte", 800),
    ];
    for filter in &filters {
        for (fragment, movie) in fragments.iter().zip(&movies) {
            assert_eq!(
                filter.matches(*fragment),
                filter.matches(&**movie),
                "{:?} on {}",
                filter.to_record(),
                movie.key()
            );
        }
    }
    assert!(filters[0].matches(&*movies[0]));
    assert!(!filters[0].matches(&*movies[2]));
    assert!(Filter::new().with("Part__file__endswith", ".mkv").matches(&*movies[1].read().media[0]));
}

#[tokio::test]
async fn sections_reload_from_the_sections_listing() {
    let catalog = FakeCatalog::new();
    catalog.respond("/library/sections", sections()).respond(
        "/library/sections/1",
        json!({"MediaContainer": {"Directory": [
            {"key": "all", "title": "All Movies"},
            {"key": "unwatched", "title": "Unwatched"}
        ]}}),
    );
    let server = catalog.server();

    let movies = server.section("Movies").await.unwrap();
    assert_eq!(movies.details_path().as_deref(), Some("/library/sections"));
    assert!(movies.is_full_object());
    assert!(server.sections().await.unwrap().iter().all(|s| s.is_full_object()));

    movies.reload().await.unwrap();
    assert_eq!(movies.read().title.as_deref(), Some("Movies"));
    assert_eq!(movies.read().locations, vec!["/data/movies"]);

    let fragment = json!({"key": "2", "title": "Shows"});
    let detached = find_items::<LibrarySection>([&fragment], &Filter::new(), &server, None).remove(0);
    assert!(detached.is_partial_object());
    detached.ensure_full().await.unwrap();
    assert!(detached.is_full_object());
    assert_eq!(detached.read().title.as_deref(), Some("TV Shows"));
    assert!(!catalog.paths().iter().any(|path| path == "/library/sections/1"));

    let unknown = json!({"key": "9", "title": "Gone"});
    let gone = find_items::<LibrarySection>([&unknown], &Filter::new(), &server, None).remove(0);
    assert!(gone.reload().await.unwrap_err().is_not_found());
    assert_eq!(gone.read().title.as_deref(), Some("Gone"));
    assert_eq!(gone.initialization_path(), "/library/sections/9");
}

#[tokio::test]
async fn section_all_builds_each_type_through_the_registry() {
    let catalog = FakeCatalog::new();
    catalog
        .respond("/library/sections", sections())
        .respond(
            "/library/sections/2/all",
            json!({"MediaContainer": {"Metadata": [
                {"key": "/library/metadata/10/children", "type": "show", "title": "Firefly", "leafCount": 14},
                {"key": "/library/metadata/30", "type": "clip", "title": "Trailer"}
            ]}}),
        );
    let server = catalog.server();

    let section = server.section_by_id(2).await.unwrap();
    let items = section.all(&Filter::new()).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].entity_type(), Some("show"));

    let show = downcast::<Show>(items[0].clone()).unwrap();
    assert_eq!(show.key(), "/library/metadata/10");
    assert_eq!(show.read().leaf_count, Some(14));
    assert!(show.is_child_of::<LibrarySection>());

    let firefly = section.get("FIREFLY").await.unwrap();
    assert_eq!(firefly.key(), "/library/metadata/10");
}

#[tokio::test]
async fn shows_walk_down_to_episodes_without_refetching_parents() {
    let catalog = FakeCatalog::new();
    catalog
        .respond(
            "/library/metadata/10",
            json!({"MediaContainer": {"Metadata": [
                {"key": "/library/metadata/10/children", "type": "show", "title": "Firefly"}
            ]}}),
        )
        .respond(
            "/library/metadata/10/children",
            json!({"MediaContainer": {"Metadata": [
                {"key": "/library/metadata/11/children", "type": "season", "index": 1,
                 "parentKey": "/library/metadata/10", "title": "Season 1"}
            ]}}),
        )
        .respond(
            "/library/metadata/11/children",
            json!({"MediaContainer": {"Metadata": [
                {"key": "/library/metadata/12", "type": "episode", "title": "Serenity",
                 "index": 1, "parentIndex": 1},
                {"key": "/library/metadata/13", "type": "episode", "title": "The Train Job",
                 "index": 2, "parentIndex": 1}
            ]}}),
        );
    let server = catalog.server();

    let show = server.fetch_item::<Show>(10u64, &Filter::new()).await.unwrap();
    let season = show.season(1).await.unwrap();
    assert_eq!(season.key(), "/library/metadata/11");

    let episodes = season.episodes(&Filter::new()).await.unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[1].read().season_episode(), "s01e02");

    let owner = episodes[0].season().await.unwrap();
    assert_eq!(owner.key(), season.key());
    let top = episodes[0].show().await.unwrap();
    assert_eq!(top.key(), show.key());
    assert_eq!(catalog.requests().len(), 3);

    let train_job = season.episode(2).await.unwrap();
    assert_eq!(train_job.read().title.as_deref(), Some("The Train Job"));
}

#[tokio::test]
async fn detached_episode_fetches_its_show_by_grandparent_key() {
    let catalog = FakeCatalog::new();
    catalog
        .respond(
            "/library/metadata/12",
            json!({"MediaContainer": {"Metadata": [{
                "key": "/library/metadata/12", "type": "episode", "title": "Serenity",
                "index": 1, "parentIndex": 1,
                "parentKey": "/library/metadata/11", "grandparentKey": "/library/metadata/10",
                "grandparentTitle": "Firefly"
            }]}}),
        )
        .respond(
            "/library/metadata/10",
            json!({"MediaContainer": {"Metadata": [
                {"key": "/library/metadata/10/children", "type": "show", "title": "Firefly"}
            ]}}),
        );
    let server = catalog.server();

    let episode = server.fetch_item::<Episode>("12", &Filter::new()).await.unwrap();
    let show = episode.show().await.unwrap();
    assert_eq!(show.read().title.as_deref(), Some("Firefly"));
    assert_eq!(
        catalog.paths(),
        vec!["/library/metadata/12", "/library/metadata/10"]
    );

    assert!(episode.season().await.unwrap_err().to_string().contains("/library/metadata/11"));
}

#[tokio::test]
async fn show_finds_episodes_by_season_and_number() {
    let catalog = FakeCatalog::new();
    catalog.respond(
        "/library/metadata/10/allLeaves",
        json!({"MediaContainer": {"Metadata": [
            {"key": "/library/metadata/12", "type": "episode", "index": 1, "parentIndex": 1},
            {"key": "/library/metadata/20", "type": "episode", "index": 1, "parentIndex": 2}
        ]}}),
    );
    let server = catalog.server();
    let show = Node::<Show>::build(
        &server,
        &json!({"key": "/library/metadata/10/children", "type": "show"}),
        None,
        None,
    );

    let episode = show.episode(2, 1).await.unwrap();
    assert_eq!(episode.key(), "/library/metadata/20");
    assert!(show.episode(3, 1).await.unwrap_err().is_not_found());
    assert_eq!(show.episodes(&Filter::new()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn movie_without_parent_finds_section_by_id() {
    let catalog = FakeCatalog::new();
    catalog
        .respond("/library/metadata/7", heat_details())
        .respond("/library/sections", sections());
    let server = catalog.server();

    let heat = server.fetch_item::<Movie>(7u64, &Filter::new()).await.unwrap();
    let section = heat.section().await.unwrap();
    assert_eq!(section.read().title.as_deref(), Some("Movies"));
}

#[tokio::test]
async fn paged_section_listing_and_scan() {
    let catalog = FakeCatalog::new();
    catalog
        .respond("/library/sections", sections())
        .respond("/library/sections/1/all", movie_listing())
        .respond("/library/sections/1/refresh", Value::Null);
    let server = catalog.server();

    let section = server.section_by_id(1).await.unwrap();
    let paging = Paging { page_size: 10, max_results: Some(2) };
    let movies = section.items_paged::<Movie>(&Filter::new(), paging).await.unwrap();
    assert_eq!(movies.len(), 2);

    section.scan().await.unwrap();
    let last = catalog.requests().pop().unwrap();
    assert_eq!(last.path, "/library/sections/1/refresh");
    assert_eq!(last.method, Method::Get);
}
