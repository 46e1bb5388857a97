//! Search Ranking Integration Tests
//!
//! Filter semantics and free-text ranking over a populated store.

use std::collections::HashSet;

use cinedb::search::text_score;
use cinedb::{
    CatalogStore, Content, ContentId, CriteriaRegistry, Genre, MemoryPersistence, QueryError,
    Review, Season, SearchEngine, StoreError, User, Viewing,
};

struct Catalog {
    store: CatalogStore<MemoryPersistence>,
    movie_a: ContentId,
    series_b: ContentId,
}

/// MovieA (Action, three reviews) and SeriesB (Drama, unreviewed)
fn catalog() -> Catalog {
    let mut store = CatalogStore::new(MemoryPersistence::new());

    let ids = store
        .add_content([
            Content::movie(
                "Action Movie",
                "Action Studios",
                Viewing::new("explosions", Genre::Action, false),
                2010,
                110,
            ),
            Content::series(
                "Series B",
                "Drama House",
                Viewing::new("feelings", Genre::Drama, true),
                [Season::new(1, 2015)],
            ),
        ])
        .unwrap();

    let reviewers = store
        .add_users([
            User::subscriber("r1", "x", "R", "One"),
            User::subscriber("r2", "x", "R", "Two"),
            User::subscriber("r3", "x", "R", "Three"),
        ])
        .unwrap();
    for (reviewer, rating) in reviewers.iter().zip([4, 5, 5]) {
        store
            .add_review(ids[0], Review::new(*reviewer, rating, ""))
            .unwrap();
    }

    Catalog {
        store,
        movie_a: ids[0],
        series_b: ids[1],
    }
}

fn ids(results: &[&Content]) -> Vec<ContentId> {
    results.iter().map(|c| c.id).collect()
}

fn id_set(results: &[&Content]) -> HashSet<ContentId> {
    results.iter().map(|c| c.id).collect()
}

#[test]
fn test_empty_query_returns_everything() {
    let c = catalog();
    let empty: [&str; 0] = [];
    let results = c.store.search(&empty).unwrap();

    let all: HashSet<ContentId> = c.store.contents().map(|item| item.id).collect();
    assert_eq!(id_set(&results), all);
}

#[test]
fn test_category_movies() {
    let c = catalog();
    let results = c.store.search(&["category", "movies"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);
}

#[test]
fn test_min_rating_excludes_unreviewed() {
    let c = catalog();
    let results = c.store.search(&["minrating", "4"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);

    let results = c.store.search(&["minrating", "0"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);
}

#[test]
fn test_category_content_matches_all_kinds() {
    let c = catalog();
    let results = c.store.search(&["category", "content"]).unwrap();
    assert_eq!(id_set(&results), HashSet::from([c.movie_a, c.series_b]));
}

#[test]
fn test_genre_never_matches_plain_content() {
    let mut c = catalog();
    let plain = c.store.add_content([Content::new("Action", "Action")]).unwrap()[0];

    let results = c.store.search(&["genre", "Action"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);
    assert!(!ids(&results).contains(&plain));
}

#[test]
fn test_filters_are_anded() {
    let c = catalog();
    let results = c
        .store
        .search(&["category", "series", "genre", "action"])
        .unwrap();
    assert!(results.is_empty());

    let results = c
        .store
        .search(&["category", "series", "suitable for minors", "yes"])
        .unwrap();
    assert_eq!(ids(&results), vec![c.series_b]);
}

#[test]
fn test_unknown_criterion_passes() {
    let c = catalog();
    let results = c.store.search(&["director", "nobody"]).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn test_free_text_ranking() {
    let mut c = catalog();
    c.store.add_content([Content::new("Movie", "Host")]).unwrap();

    let movie_a = c.store.content(&c.movie_a).unwrap();
    assert_eq!(text_score(movie_a, "actionmovie"), 2);

    let results = c.store.search(&["Action Movie"]).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, c.movie_a);
    assert_eq!(results[1].title, "Movie");
}

#[test]
fn test_filters_with_free_text() {
    let c = catalog();
    let results = c.store.search(&["category", "movies", "studios"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);

    let results = c.store.search(&["category", "movies", "drama"]).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_suitability_free_text() {
    let c = catalog();
    let results = c.store.search(&["not suitable"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);
}

#[test]
fn test_malformed_min_rating_is_rejected() {
    let c = catalog();
    let result = c.store.search(&["minrating", "lots"]);
    assert!(matches!(
        result,
        Err(StoreError::Query(QueryError::InvalidRating { .. }))
    ));
}

#[test]
fn test_custom_criterion_registry() {
    fn year_before_2012(_value: &str) -> Result<cinedb::search::Predicate, QueryError> {
        Ok(Box::new(|content: &Content| {
            matches!(content.details, cinedb::ContentDetails::Movie { year, .. } if year < 2012)
        }))
    }

    let mut registry = CriteriaRegistry::standard();
    registry.register("oldmovie", year_before_2012);

    let c = catalog();
    let store = c.store.with_search_engine(SearchEngine::new(registry));
    let results = store.search(&["old movie", "yes"]).unwrap();
    assert_eq!(ids(&results), vec![c.movie_a]);
}
