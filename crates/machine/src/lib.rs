// SPDX-License-Identifier: MIT

//! ak-machine: the `Machine` trait — the opaque state-machine engine
//! the host treats as a collaborator (spec §1, §9 "machine engine as
//! collaborator"). The host only ever calls `start`/`restore`/`send`/
//! `get_snapshot`; hierarchical state, guards, parallel regions, and
//! migrations are entirely the trait implementor's business.
//!
//! `todo` holds a small reference machine (spec §8's `todo/L1`
//! scenario) used by the test suite and the demo binary in ak-daemon.

pub mod todo;

use ak_core::{Caller, Event, Snapshot};
use ak_patch::PatchOperation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A failed `send`: the event was schema-valid but the machine's own
/// transition logic rejected or threw. Per spec §4.4(ii), this leaves
/// machine state unchanged and emits no patch — it is not forwarded to
/// callers as a hard error.
#[derive(Debug, Error)]
#[error("machine rejected event {event_type:?}: {reason}")]
pub struct MachineError {
    pub event_type: String,
    pub reason: String,
}

impl MachineError {
    pub fn new(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { event_type: event_type.into(), reason: reason.into() }
    }
}

/// Bounds shared by every machine's context/value types: cheap to
/// clone for projection, and serializable for persistence + checksum.
pub trait StateShape: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}
impl<T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static> StateShape for T {}

/// The opaque engine interface (spec §1, §4.4, §9).
pub trait Machine: Send + 'static {
    type Public: StateShape;
    type Private: StateShape + Default;
    type Value: StateShape + PartialEq;
    type Input: StateShape;

    /// First-time construction from the actor's birth parameters
    /// (spec §4.4 `spawn`).
    fn start(initial_caller: Caller, input: Self::Input) -> Self
    where
        Self: Sized;

    /// Rehydrate from a snapshot already migrated to this version's
    /// schema (spec §3 Lifecycle).
    fn restore(snapshot: Snapshot<Self::Public, Self::Private, Self::Value>, initial_caller: Caller, input: Self::Input) -> Self
    where
        Self: Sized;

    /// One transition per dequeued event. `Err` means "reject silently":
    /// the host logs and drops the event without mutating state.
    fn send(&mut self, event: &Event) -> Result<(), MachineError>;

    fn get_snapshot(&self) -> Snapshot<Self::Public, Self::Private, Self::Value>;

    /// Patch operations that bring a raw, possibly-stale persisted
    /// snapshot up to the schema this version of the machine expects,
    /// applied by the host to the raw JSON before it is deserialized
    /// into `Snapshot<Self::Public, ..>` and handed to [`Machine::restore`].
    ///
    /// Most machines never change schema and can accept the default
    /// (no-op) implementation.
    fn migration_ops(_raw_snapshot: &serde_json::Value) -> Vec<PatchOperation>
    where
        Self: Sized,
    {
        Vec::new()
    }
}
