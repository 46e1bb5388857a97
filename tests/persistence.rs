//! Persistence Integration Tests
//!
//! JSONL layout, reload through `CatalogStore::open`, and cleanup of
//! records that refer to missing entities.

use std::fs;

use cinedb::config::ResolvedConfig;
use cinedb::{
    CatalogStore, Content, ContentKind, Episode, Genre, JsonlPersistence, MemoryPersistence,
    Persistence, PersistenceError, Review, Role, Season, StoreError, User, UserRole, Viewing,
};
use tempfile::TempDir;

fn create_test_store() -> (CatalogStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = ResolvedConfig::with_home(temp_dir.path().join("cinedb"));
    let store = CatalogStore::open_from_config(&config).unwrap();
    (store, temp_dir)
}

fn reopen(temp_dir: &TempDir) -> CatalogStore {
    let config = ResolvedConfig::with_home(temp_dir.path().join("cinedb"));
    CatalogStore::open_from_config(&config).unwrap()
}

#[test]
fn test_fresh_store_is_empty() {
    let (store, temp_dir) = create_test_store();
    assert_eq!(store.content_len(), 0);
    assert_eq!(store.user_len(), 0);
    assert!(!temp_dir.path().join("cinedb").join("content.jsonl").exists());
}

#[test]
fn test_round_trip_through_files() {
    let (mut store, temp_dir) = create_test_store();

    let ids = store
        .add_content([
            Content::new("Notes", "Someone"),
            Content::movie(
                "Heat",
                "Michael Mann",
                Viewing::new("Cops and robbers", Genre::Action, false),
                1995,
                170,
            ),
            Content::series(
                "Lost",
                "J. J. Abrams",
                Viewing::new("Island", Genre::ScienceFiction, true),
                [Season::new(1, 2004).with_episodes([Episode::new(42), Episode::new(44)])],
            ),
        ])
        .unwrap();
    let users = store
        .add_users([
            User::admin("root", "hash", "Ada", "Admin"),
            User::subscriber("alice", "hash", "Alice", "A"),
        ])
        .unwrap();
    store.link_related(ids[1], ids[2]).unwrap();
    store.add_favorite(users[1], ids[2]).unwrap();
    store
        .add_review(ids[1], Review::new(users[1], 5, "classic"))
        .unwrap();

    let reloaded = reopen(&temp_dir);
    assert_eq!(reloaded.content_len(), 3);
    assert_eq!(reloaded.user_len(), 2);
    assert_eq!(reloaded.stats(), store.stats());

    let heat = reloaded.content(&ids[1]).unwrap();
    assert_eq!(heat.kind(), ContentKind::Movie);
    assert!(heat.related.contains(&ids[2]));
    assert_eq!(heat.reviews[&users[1]].text, "classic");
    assert_eq!(heat.formatted_average_rating(), "5.0");

    let lost = reloaded.content(&ids[2]).unwrap();
    assert_eq!(lost.seasons().len(), 1);
    assert_eq!(lost.seasons()[0].total_duration(), 86);
    assert_eq!(lost.viewing().unwrap().genre, Genre::ScienceFiction);

    let alice = reloaded.user_by_username("alice").unwrap();
    assert_eq!(alice.user_role(), UserRole::Subscriber);
    assert!(alice.favorites().unwrap().contains(&ids[2]));
    assert_eq!(reloaded.user(&users[0]).unwrap().user_role(), UserRole::Admin);
}

#[test]
fn test_one_record_per_line() {
    let (mut store, temp_dir) = create_test_store();
    store
        .add_content([Content::new("A", "a"), Content::new("B", "b")])
        .unwrap();

    let path = temp_dir.path().join("cinedb").join("content.jsonl");
    let raw = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["kind"], "generic");
    }
}

#[test]
fn test_dangling_references_pruned_on_load() {
    let alice = User::subscriber("alice", "x", "Alice", "A");
    let ghost = User::subscriber("ghost", "x", "Ghost", "G");
    let missing = Content::new("Missing", "nobody");

    let mut heat = Content::movie(
        "Heat",
        "Michael Mann",
        Viewing::new("s", Genre::Action, false),
        1995,
        170,
    );
    heat.related.insert(missing.id);
    heat.reviews
        .insert(alice.id, Review::new(alice.id, 4, "good"));
    heat.reviews
        .insert(ghost.id, Review::new(ghost.id, 1, "bad"));

    let mut alice_with_favs = alice.clone();
    if let Role::Subscriber { favorites } = &mut alice_with_favs.role {
        favorites.insert(heat.id);
        favorites.insert(missing.id);
    }

    let persistence = MemoryPersistence::seeded(vec![heat.clone()], vec![alice_with_favs]);
    let store = CatalogStore::open(persistence).unwrap();

    let loaded = store.content(&heat.id).unwrap();
    assert!(loaded.related.is_empty());
    assert_eq!(loaded.reviews.len(), 1);
    assert!(loaded.reviews.contains_key(&alice.id));

    let favorites = store.user(&alice.id).unwrap().favorites().unwrap();
    assert_eq!(favorites.len(), 1);
    assert!(favorites.contains(&heat.id));

    // Nothing written on load
    assert_eq!(store.persistence().content_saves(), 0);
    assert_eq!(store.persistence().user_saves(), 0);
}

#[test]
fn test_duplicates_dropped_on_load() {
    let first = Content::new("Heat", "Michael Mann");
    let copy = Content::new("Heat", "Michael Mann");
    let alice = User::subscriber("alice", "x", "Alice", "A");
    let impostor = User::admin("alice", "x", "Someone", "Else");

    let persistence = MemoryPersistence::seeded(vec![first, copy], vec![alice, impostor]);
    let store = CatalogStore::open(persistence).unwrap();

    assert_eq!(store.content_len(), 1);
    assert_eq!(store.user_len(), 1);
    assert_eq!(
        store.user_by_username("alice").unwrap().user_role(),
        UserRole::Subscriber
    );
}

#[test]
fn test_malformed_line_reports_position() {
    let temp_dir = TempDir::new().unwrap();
    let content_path = temp_dir.path().join("content.jsonl");
    let users_path = temp_dir.path().join("users.jsonl");

    let good = serde_json::to_string(&Content::new("A", "a")).unwrap();
    fs::write(&content_path, format!("{}\n\n{{not json\n", good)).unwrap();

    let persistence = JsonlPersistence::new(&content_path, &users_path);
    match persistence.load_content() {
        Err(PersistenceError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other.map(|c| c.len())),
    }

    let result = CatalogStore::open(JsonlPersistence::new(&content_path, &users_path));
    assert!(matches!(
        result,
        Err(StoreError::Persistence(PersistenceError::Parse { .. }))
    ));
}

#[test]
fn test_failed_write_leaves_memory_ahead_until_flush() {
    let mut store = CatalogStore::new(MemoryPersistence::new());
    store.persistence().fail_writes(true);

    let result = store.add_content([Content::new("Heat", "Michael Mann")]);
    assert!(matches!(result, Err(StoreError::Persistence(_))));
    assert_eq!(store.content_len(), 1);
    assert!(store.persistence().stored_content().is_empty());

    store.persistence().fail_writes(false);
    store.flush().unwrap();
    assert_eq!(store.persistence().stored_content().len(), 1);
}
