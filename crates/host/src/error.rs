// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Error kinds raised by the actor host (spec §7), independent of any
/// particular transport — `ak-router` maps these to HTTP status codes.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("event failed schema validation")]
    BadEvent,
    #[error("wait timed out before the requested condition was observed")]
    WaitTimeout,
    #[error("send before spawn")]
    NotReady,
    #[error("actor {actor} already spawned with different birth parameters")]
    AlreadySpawnedDifferent { actor: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ak_storage::StorageError> for HostError {
    fn from(e: ak_storage::StorageError) -> Self {
        HostError::Internal(e.to_string())
    }
}
