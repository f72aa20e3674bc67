// SPDX-License-Identifier: MIT

//! Shared axum `State`: the registry for one actor type, the token
//! signing key, and the event validator collaborator (spec §1, §4.1,
//! §4.5).

use std::sync::Arc;

use ak_core::Clock;
use ak_machine::Machine;
use ak_storage::SnapshotStore;

use crate::registry::Registry;
use crate::validate::EventValidator;

/// Cloneable axum state scoped to a single `actorType`. A process that
/// serves several actor types mounts one [`RouterState`]/nested router
/// per type (see `ak-daemon`).
pub struct RouterState<M: Machine, S: SnapshotStore, C: Clock, V: EventValidator> {
    pub registry: Arc<Registry<M, S, C>>,
    pub signing_key: Arc<[u8]>,
    pub validator: Arc<V>,
}

impl<M: Machine, S: SnapshotStore, C: Clock, V: EventValidator> Clone for RouterState<M, S, C, V> {
    fn clone(&self) -> Self {
        Self { registry: self.registry.clone(), signing_key: self.signing_key.clone(), validator: self.validator.clone() }
    }
}

impl<M: Machine, S: SnapshotStore, C: Clock, V: EventValidator> RouterState<M, S, C, V> {
    pub fn new(registry: Registry<M, S, C>, signing_key: impl Into<Arc<[u8]>>, validator: V) -> Self {
        Self { registry: Arc::new(registry), signing_key: signing_key.into(), validator: Arc::new(validator) }
    }
}
