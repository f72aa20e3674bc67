// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors surfaced to `onError` and returned from [`crate::ActorClient`]
/// methods (spec §4.7).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("applying an incoming patch failed against the local baseline; reconnecting to resync")]
    PatchFailed,
    #[error("not connected to the actor")]
    NotConnected,
    #[error("waitFor timed out before the predicate matched")]
    WaitTimeout,
    #[error("websocket transport error: {0}")]
    Transport(String),
    #[error("exhausted reconnect attempts")]
    ReconnectExhausted,
}
