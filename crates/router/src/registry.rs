// SPDX-License-Identifier: MIT

//! C5 registry: `(actorType, actorId) -> ActorHost`, lazily spawning on
//! first contact (spec §4.5 "Spawn semantics", §9 "Global mutable
//! registry"). One [`Registry`] is scoped to a single `actorType` and
//! a single [`ak_machine::Machine`] implementation — composing several
//! actor types means mounting one registry (and one axum sub-router)
//! per type, which is what [`crate::router`] does (see DESIGN.md).
//!
//! Grounded in `dashmap`'s sharded-lock map, already a pack dependency
//! (examples/clockworklabs-SpacetimeDB uses it for its connection
//! table); per-key locking is exactly spec §9's "serialize `spawn` per
//! address without globally serializing distinct addresses".

use std::sync::Arc;
use std::time::Duration;

use ak_core::{Caller, Clock};
use ak_host::{ActorHandle, HostError};
use ak_machine::Machine;
use ak_storage::SnapshotStore;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

pub struct Registry<M: Machine, S: SnapshotStore, C: Clock> {
    actor_type: String,
    store: Arc<S>,
    clock: C,
    cache_ttl: Duration,
    persist_debounce: Duration,
    handles: DashMap<String, ActorHandle<M>>,
}

impl<M: Machine, S: SnapshotStore, C: Clock> Registry<M, S, C> {
    pub fn new(actor_type: impl Into<String>, store: Arc<S>, clock: C, cache_ttl: Duration, persist_debounce: Duration) -> Self {
        Self { actor_type: actor_type.into(), store, clock, cache_ttl, persist_debounce, handles: DashMap::new() }
    }

    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    /// Returns the host for `actor_id`, spawning it on first contact.
    /// `spawn` is idempotent (spec §4.4: "on a hit, it skips") so it is
    /// always awaited here, even on an already-occupied entry — the
    /// handle's task processes commands FIFO, so awaiting `spawn` on
    /// the occupied path still guarantees the original spawn has
    /// completed before this caller's own command is enqueued (spec
    /// §4.5 "spawns are serialized per address").
    pub async fn get_or_spawn(&self, actor_id: &str, initial_caller: Caller, input: M::Input) -> Result<ActorHandle<M>, HostError> {
        let handle = match self.handles.entry(actor_id.to_string()) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(e) => {
                let handle = ActorHandle::spawn_task(self.store.clone(), self.clock.clone(), self.cache_ttl, self.persist_debounce);
                e.insert(handle.clone());
                handle
            }
        };
        handle.spawn(self.actor_type.clone(), actor_id.to_string(), initial_caller, input).await?;
        Ok(handle)
    }

    /// Looks up an already-spawned host without spawning one.
    pub fn get(&self, actor_id: &str) -> Option<ActorHandle<M>> {
        self.handles.get(actor_id).map(|h| h.clone())
    }

    /// Number of actors of this type currently spawned, for `GET
    /// /healthz` (SPEC_FULL.md §11).
    pub fn live_actor_count(&self) -> usize {
        self.handles.len()
    }

    /// Forces every spawned actor to flush a pending persistence write,
    /// for graceful shutdown (SPEC_FULL.md §11).
    pub async fn flush_all(&self) {
        let handles: Vec<_> = self.handles.iter().map(|entry| entry.value().clone()).collect();
        for handle in handles {
            handle.flush().await;
        }
    }

    #[cfg(test)]
    pub(crate) fn spawned_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
