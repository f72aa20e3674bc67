// SPDX-License-Identifier: MIT

use ak_core::{CallerSnapshot, Caller};
use ak_patch::Checksum;
use ak_patch::PatchOperation;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// `{ operations, checksum }` — the only server-to-client WebSocket
/// message shape (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct Patch {
    pub operations: Vec<PatchOperation>,
    pub checksum: Checksum,
}

/// Why the host unilaterally closed a subscriber's socket. The only
/// reason today is the bounded transport filling up faster than the
/// router can drain it (spec §5 "a slow subscriber ... exceeding the
/// bound closes that subscription with RESYNC_REQUIRED").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ResyncRequired,
}

/// A live subscription bound to `(caller, lastProjection)` (spec §3).
///
/// Patches flow over a bounded channel so a subscriber that cannot keep
/// up applies backpressure rather than growing memory without bound;
/// `close_tx` is a separate, effectively-unbounded side channel used
/// only to deliver the one-time close signal once that bound is
/// exceeded, so it is never itself subject to the same backpressure.
pub(crate) struct Subscriber<P, Pr, V> {
    pub id: Uuid,
    pub caller: Caller,
    pub last_projection: CallerSnapshot<P, Pr, V>,
    pub sender: mpsc::Sender<Patch>,
    pub close_tx: mpsc::UnboundedSender<CloseReason>,
}
