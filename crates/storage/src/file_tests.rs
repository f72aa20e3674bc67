use super::*;
use crate::SnapshotStore;
use serde_json::json;

fn snapshot(value: &str) -> PersistedSnapshot {
    PersistedSnapshot { version: 1, state: json!({"v": value}), created_at: Utc::now() }
}

#[tokio::test]
async fn load_of_missing_actor_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    assert!(store.load("todo", "L1").await.unwrap().is_none());
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    store.save("todo", "L1", &snapshot("a")).await.unwrap();

    let loaded = store.load("todo", "L1").await.unwrap().unwrap();
    assert_eq!(loaded.state, json!({"v": "a"}));
}

#[tokio::test]
async fn repeated_saves_rotate_backups() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());

    for v in ["a", "b", "c"] {
        store.save("todo", "L1", &snapshot(v)).await.unwrap();
    }

    let path = store.path_for("todo", "L1");
    assert!(path.exists());
    assert!(path.with_extension("bak").exists());
}

#[tokio::test]
async fn distinct_actors_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    store.save("todo", "L1", &snapshot("a")).await.unwrap();
    store.save("todo", "L2", &snapshot("b")).await.unwrap();

    assert_eq!(store.load("todo", "L1").await.unwrap().unwrap().state, json!({"v": "a"}));
    assert_eq!(store.load("todo", "L2").await.unwrap().unwrap().state, json!({"v": "b"}));
}

#[tokio::test]
async fn meta_round_trips_through_its_own_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    assert!(store.load_meta("todo", "L1").await.unwrap().is_none());

    let meta = ActorMeta {
        actor_type: "todo".to_string(),
        actor_id: "L1".to_string(),
        initial_caller: json!({"type": "client", "id": "U1"}),
        input: json!({}),
    };
    store.save_meta(&meta).await.unwrap();

    let loaded = store.load_meta("todo", "L1").await.unwrap().unwrap();
    assert_eq!(loaded.initial_caller, json!({"type": "client", "id": "U1"}));
}
