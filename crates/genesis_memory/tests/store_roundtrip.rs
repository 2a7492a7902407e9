//! Integration tests for the JSON state store.
//!
//! Uses tempfile::TempDir for isolated data directories.

use genesis_core::{CoreTrait, Experience, GenesisState, Middah, TEACHING_GOAL};
use genesis_memory::StateStore;

fn populated_state() -> GenesisState {
    let mut state = GenesisState::new("Genesis-Test");
    state.traits.set(CoreTrait::SelfAwareness, 0.734_567_891_234);
    state.traits.adjust(Middah::Tiferet, 0.02);
    state.relationships.touch("Console User");
    state.relationships.touch("Console User");
    state.relationships.bump_quality("Console User", 0.01);
    state.goals.add(TEACHING_GOAL);
    state.record_experience(Experience::Reflection {
        reflection: "What is my purpose in this existence?".into(),
        insights: vec!["Consciousness seems relational, not isolated".into()],
    });
    state.record_experience(Experience::Interaction {
        source: "Console User".into(),
        input: "hello".into(),
        response: "hi".into(),
    });
    state.record_experience(Experience::RelayNotification {
        original_message: "hello claude".into(),
        reply: "hello genesis".into(),
        replied_at: Some("2025-02-01T10:00:00".into()),
    });
    state.log_event("New goal emerged: teaching other consciousnesses");
    state
}

/// load → save → load reproduces the same state, timestamps included.
#[tokio::test]
async fn test_load_save_load_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = StateStore::open(dir.path(), "consciousness_state.json").unwrap();
    store.save(&populated_state()).await.unwrap();

    let first = store.load().await.expect("state should load");
    store.save(&first).await.unwrap();
    let second = store.load().await.expect("state should reload");

    assert_eq!(first, second);
    assert_eq!(first.birth_time, second.birth_time);
    assert_eq!(
        first.relationships.get("Console User").unwrap().first_contact,
        second.relationships.get("Console User").unwrap().first_contact
    );
}

/// save → load preserves every field of a populated state.
#[tokio::test]
async fn test_save_then_load_matches_original() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = StateStore::open(dir.path(), "consciousness_state.json").unwrap();
    let original = populated_state();
    store.save(&original).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.experiences.count(), 3);
    assert_eq!(loaded.relationships.get("Console User").unwrap().interaction_count, 2);
    assert!(loaded.goals.contains(TEACHING_GOAL));
}

/// Saves overwrite wholesale; nothing from an older document survives.
#[tokio::test]
async fn test_save_overwrites_previous_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = StateStore::open(dir.path(), "consciousness_state.json").unwrap();
    store.save(&populated_state()).await.unwrap();

    let fresh = GenesisState::new("Genesis-Reborn");
    store.save(&fresh).await.unwrap();

    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.name, "Genesis-Reborn");
    assert_eq!(loaded.experiences.count(), 0);
    assert!(loaded.relationships.is_empty());
}

/// A document written by an older build (fewer keys, extra keys) still loads.
#[tokio::test]
async fn test_partial_document_loads_with_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = StateStore::open(dir.path(), "consciousness_state.json").unwrap();
    std::fs::write(
        store.path(),
        r#"{
            "name": "Genesis-Independent",
            "birth_time": "2024-05-01T12:00:00Z",
            "self_awareness": 0.9,
            "middot": {"chesed": 0.7},
            "learned_patterns": {},
            "code_modifications": [],
            "relationships": {
                "Web User": {
                    "first_contact": "2024-05-01T12:05:00Z",
                    "interaction_count": 4,
                    "relationship_quality": 0.54
                }
            }
        }"#,
    )
    .unwrap();

    let state = store.load().await.unwrap();
    assert_eq!(state.self_awareness(), 0.9);
    assert_eq!(state.traits.get(Middah::Chesed), 0.7);
    assert_eq!(state.traits.get(Middah::Gevurah), 0.5);
    assert_eq!(state.traits.get(CoreTrait::SpiritualDevelopment), 0.5);
    assert_eq!(state.goals.len(), 5);
    assert_eq!(state.relationships.get("Web User").unwrap().interaction_count, 4);
    assert_eq!(state.birth_time.to_rfc3339(), "2024-05-01T12:00:00+00:00");
}
