// SPDX-License-Identifier: MIT

//! ak-storage: where an actor's last-known snapshot lives between
//! restarts (spec §3 Lifecycle, §6).
//!
//! The host never touches a file path directly — it talks to a
//! [`SnapshotStore`], so the demo binary in ak-daemon can swap the file
//! backend for something else (an in-memory store in tests, eventually
//! an object-store backend) without touching ak-host.
//!
//! `FileSnapshotStore`'s backup rotation is grounded in the teacher's
//! `oj-daemon::storage::snapshot::rotate_bak_path` (3-generation `.bak`
//! / `.bak.2` / `.bak.3` rotation); the whole-document overwrite model
//! replaces the teacher's WAL+snapshot split since spec §6 has no WAL.

mod file;
mod memory;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error for actor {actor}: {source}")]
    Io { actor: String, #[source] source: std::io::Error },
    #[error("serialization error for actor {actor}: {source}")]
    Json { actor: String, #[source] source: serde_json::Error },
}

/// A persisted snapshot envelope: the raw JSON body plus the bookkeeping
/// the host needs to decide whether a migration is required.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistedSnapshot {
    /// Schema version the machine implementation stamps into its own
    /// snapshots; ak-storage treats it as opaque and only round-trips it.
    #[serde(default)]
    pub version: u32,
    pub state: Value,
    pub created_at: DateTime<Utc>,
}

/// An actor's birth parameters (spec §3 Lifecycle, §6 "Persisted
/// layout"): the `(actorType, actorId, initialCaller, input)` tuple
/// recorded on first `spawn` so the host can rehydrate on cold start.
/// `initial_caller`/`input` are kept as raw JSON here so this crate
/// does not need to depend on `ak-core`/`ak-machine` for their types.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActorMeta {
    pub actor_type: String,
    pub actor_id: String,
    pub initial_caller: Value,
    pub input: Value,
}

/// Durable storage for one actor's latest snapshot. Implementors persist
/// the *whole* snapshot on every write — spec §6 has no incremental WAL,
/// only a full-state resync protocol, so there is nothing to replay.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    async fn load(&self, actor_type: &str, actor_id: &str) -> Result<Option<PersistedSnapshot>, StorageError>;

    async fn save(&self, actor_type: &str, actor_id: &str, snapshot: &PersistedSnapshot) -> Result<(), StorageError>;

    /// Loads the birth parameters recorded by the first `spawn`, if any.
    async fn load_meta(&self, actor_type: &str, actor_id: &str) -> Result<Option<ActorMeta>, StorageError>;

    /// Persists birth parameters. Called exactly once, by the `spawn`
    /// that wins the race to construct an actor (spec §4.4).
    async fn save_meta(&self, meta: &ActorMeta) -> Result<(), StorageError>;
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
