// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{ActorMeta, PersistedSnapshot, SnapshotStore, StorageError};

/// In-process [`SnapshotStore`] for tests: ak-host's and ak-daemon's
/// test suites use this instead of standing up a temp directory.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<(String, String), PersistedSnapshot>>,
    meta: Mutex<HashMap<(String, String), ActorMeta>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, actor_type: &str, actor_id: &str) -> Result<Option<PersistedSnapshot>, StorageError> {
        let key = (actor_type.to_string(), actor_id.to_string());
        Ok(self.snapshots.lock().get(&key).cloned())
    }

    async fn save(&self, actor_type: &str, actor_id: &str, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        let key = (actor_type.to_string(), actor_id.to_string());
        self.snapshots.lock().insert(key, snapshot.clone());
        Ok(())
    }

    async fn load_meta(&self, actor_type: &str, actor_id: &str) -> Result<Option<ActorMeta>, StorageError> {
        let key = (actor_type.to_string(), actor_id.to_string());
        Ok(self.meta.lock().get(&key).cloned())
    }

    async fn save_meta(&self, meta: &ActorMeta) -> Result<(), StorageError> {
        let key = (meta.actor_type.clone(), meta.actor_id.clone());
        self.meta.lock().insert(key, meta.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemorySnapshotStore::new();
        let snapshot = PersistedSnapshot { version: 1, state: json!({"a": 1}), created_at: chrono::Utc::now() };
        store.save("todo", "L1", &snapshot).await.unwrap();
        let loaded = store.load("todo", "L1").await.unwrap().unwrap();
        assert_eq!(loaded.state, json!({"a": 1}));
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let store = MemorySnapshotStore::new();
        assert!(store.load("todo", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn meta_round_trips_and_is_keyed_by_address() {
        let store = MemorySnapshotStore::new();
        assert!(store.load_meta("todo", "L1").await.unwrap().is_none());

        let meta = ActorMeta {
            actor_type: "todo".to_string(),
            actor_id: "L1".to_string(),
            initial_caller: json!({"type": "client", "id": "U1"}),
            input: json!({}),
        };
        store.save_meta(&meta).await.unwrap();

        let loaded = store.load_meta("todo", "L1").await.unwrap().unwrap();
        assert_eq!(loaded.actor_id, "L1");
        assert!(store.load_meta("todo", "L2").await.unwrap().is_none());
    }
}
