// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{ActorMeta, PersistedSnapshot, SnapshotStore, StorageError};

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups. The oldest is dropped once the
/// limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| if n == 1 { path.with_extension("bak") } else { path.with_extension(format!("bak.{n}")) };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = std::fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = std::fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Persists each actor's snapshot as `<dir>/<actorType>/<actorId>.json`,
/// rotating the previous file to `.bak` before every overwrite.
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, actor_type: &str, actor_id: &str) -> PathBuf {
        self.root.join(actor_type).join(format!("{actor_id}.json"))
    }

    fn meta_path_for(&self, actor_type: &str, actor_id: &str) -> PathBuf {
        self.root.join(actor_type).join(format!("{actor_id}.meta.json"))
    }

    fn io_err(actor: &str, source: std::io::Error) -> StorageError {
        StorageError::Io { actor: actor.to_string(), source }
    }

    fn json_err(actor: &str, source: serde_json::Error) -> StorageError {
        StorageError::Json { actor: actor.to_string(), source }
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, actor_type: &str, actor_id: &str) -> Result<Option<PersistedSnapshot>, StorageError> {
        let path = self.path_for(actor_type, actor_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_err(actor_id, e)),
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(|e| Self::json_err(actor_id, e))?;
        Ok(Some(snapshot))
    }

    async fn save(&self, actor_type: &str, actor_id: &str, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        let path = self.path_for(actor_type, actor_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Self::io_err(actor_id, e))?;
        }

        let encoded = serde_json::to_vec_pretty(snapshot).map_err(|e| Self::json_err(actor_id, e))?;

        if path.exists() {
            let bak = rotate_bak_path(&path);
            if let Err(e) = tokio::fs::rename(&path, &bak).await {
                warn!(actor = actor_id, error = %e, "failed to rotate snapshot backup, overwriting anyway");
            }
        }

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &encoded).await.map_err(|e| Self::io_err(actor_id, e))?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| Self::io_err(actor_id, e))?;
        debug!(actor = actor_id, bytes = encoded.len(), "persisted snapshot");
        Ok(())
    }

    async fn load_meta(&self, actor_type: &str, actor_id: &str) -> Result<Option<ActorMeta>, StorageError> {
        let path = self.meta_path_for(actor_type, actor_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_err(actor_id, e)),
        };
        let meta = serde_json::from_slice(&bytes).map_err(|e| Self::json_err(actor_id, e))?;
        Ok(Some(meta))
    }

    async fn save_meta(&self, meta: &ActorMeta) -> Result<(), StorageError> {
        let path = self.meta_path_for(&meta.actor_type, &meta.actor_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Self::io_err(&meta.actor_id, e))?;
        }
        let encoded = serde_json::to_vec_pretty(meta).map_err(|e| Self::json_err(&meta.actor_id, e))?;
        tokio::fs::write(&path, &encoded).await.map_err(|e| Self::io_err(&meta.actor_id, e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
