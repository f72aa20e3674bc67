// SPDX-License-Identifier: MIT

//! ak-router: C5 (registry + HTTP/WebSocket dispatch) and C6 (the
//! server-side fetch protocol), built on axum.
//!
//! One [`router`] call mounts a single actor type at
//! `/api/<actorType>`; a process serving several types nests one of
//! these per type (see `ak-daemon`). Unknown actor types fall through
//! to axum's own 404 because no nested prefix matches them — the
//! registry never has to check the type itself (spec §4.5).

pub mod error;
pub mod fetch;
pub mod http;
pub mod registry;
pub mod state;
pub mod validate;
mod ws;

use ak_core::Clock;
use ak_machine::Machine;
use ak_storage::SnapshotStore;
use axum::routing::get;
use axum::Router;

pub use error::RouterError;
pub use fetch::{fetch_snapshot, FetchError, FetchOptions};
pub use http::{ApiQuery, GetSnapshotBody, PostEventBody, SnapshotBody};
pub use registry::Registry;
pub use state::RouterState;
pub use validate::{EventValidator, PermissiveValidator};

/// Builds the axum sub-router for one actor type, nested at
/// `/api/<actorType>`.
pub fn router<M, S, C, V>(state: RouterState<M, S, C, V>) -> Router
where
    M: Machine,
    M::Input: Default,
    S: SnapshotStore,
    C: Clock,
    V: EventValidator,
{
    let actor_type = state.registry.actor_type().to_string();
    let inner = Router::new()
        .route("/:actor_id", get(http::get_or_upgrade::<M, S, C, V>).post(http::post_event::<M, S, C, V>))
        .with_state(state);
    Router::new().nest(&format!("/api/{actor_type}"), inner)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
