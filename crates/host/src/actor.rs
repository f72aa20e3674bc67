// SPDX-License-Identifier: MIT

//! C4 — the actor host: a single-threaded event loop per actor (spec
//! §4.4, §5, §9 "suspension model").
//!
//! Each actor is one Tokio task owning an `mpsc::Receiver<Command>`;
//! [`ActorHandle`] is a cheap clone-able front sending commands in and
//! (for request/response calls) awaiting a `oneshot` reply, the same
//! handle-around-a-task shape the teacher's daemon uses for its
//! runtime/event-bus split (see `oj-daemon::adapters::agent::docker::ws`
//! for the same `tokio::select!`-over-channel-plus-timeout idiom this
//! loop follows). Only this task ever touches the machine, the
//! subscription set, or the snapshot cache — that is what makes
//! per-actor linearizability mechanical rather than something every
//! caller has to get right.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ak_core::{Caller, CallerSnapshot, Clock, Event, Snapshot, SystemEventKind};
use ak_machine::Machine;
use ak_patch::{Checksum, PatchOperation};
use ak_storage::{ActorMeta, PersistedSnapshot, SnapshotStore};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant as TokioInstant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::SnapshotCache;
use crate::error::HostError;
use crate::project::project;
use crate::subscription::{CloseReason, Patch, Subscriber};

const COMMAND_BUFFER: usize = 256;
/// Bound on a subscriber's outstanding-patch queue (spec §5 "a slow
/// subscriber may have writes buffered bounded by the transport").
/// Exceeding it closes that subscription with [`CloseReason::ResyncRequired`]
/// rather than growing the queue without bound.
const SUBSCRIBER_BUFFER: usize = 256;
const PERSIST_BACKOFF_BASE: Duration = Duration::from_millis(200);
const PERSIST_BACKOFF_MAX: Duration = Duration::from_secs(30);
const MAX_PERSIST_RETRY_EXP: u32 = 8;

/// A blocking condition for [`ActorHandle::get_snapshot`] (spec §4.4).
///
/// "Equal in shape to `wait.event`" is realized here as event-type
/// equality — the cheapest reading of "shape" that is still concretely
/// checkable without the schema library this crate treats as a
/// collaborator (see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct WaitFor {
    pub event_type: Option<String>,
    pub state: Option<Value>,
    pub timeout: Duration,
    pub error_on_timeout: bool,
}

pub struct GetSnapshotResult<P, Pr, V> {
    pub snapshot: CallerSnapshot<P, Pr, V>,
    pub checksum: Checksum,
}

/// What `connect` hands the router: a receiver the caller forwards onto
/// a WebSocket, plus the message (if any) to send immediately as the
/// initial resync (spec §4.4 "Initial resync on upgrade").
pub struct ConnectResult {
    pub subscription_id: Uuid,
    pub patch_receiver: mpsc::Receiver<Patch>,
    pub close_receiver: mpsc::UnboundedReceiver<CloseReason>,
    pub initial_patch: Option<Patch>,
}

type SnapshotReply<M> =
    oneshot::Sender<Result<GetSnapshotResult<<M as Machine>::Public, <M as Machine>::Private, <M as Machine>::Value>, HostError>>;

enum Command<M: Machine> {
    Spawn {
        actor_type: String,
        actor_id: String,
        initial_caller: Caller,
        input: M::Input,
        reply: oneshot::Sender<Result<(), HostError>>,
    },
    Send {
        event: Event,
        reply: oneshot::Sender<Result<(), HostError>>,
    },
    GetSnapshot {
        caller_id: String,
        wait: Option<WaitFor>,
        reply: SnapshotReply<M>,
    },
    Connect {
        caller: Caller,
        baseline_checksum: Option<Checksum>,
        reply: oneshot::Sender<Result<ConnectResult, HostError>>,
    },
    Disconnect {
        subscription_id: Uuid,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

struct Waiter<M: Machine> {
    condition: WaitFor,
    caller_id: String,
    deadline: TokioInstant,
    reply: Option<SnapshotReply<M>>,
}

/// Cheap, clone-able front for one actor's task. Every method sends a
/// [`Command`] over a channel and (for calls that need a result) awaits
/// a `oneshot` reply — the task itself never runs two commands at once.
pub struct ActorHandle<M: Machine> {
    tx: mpsc::Sender<Command<M>>,
}

impl<M: Machine> Clone for ActorHandle<M> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

fn channel_closed<T>(_: T) -> HostError {
    HostError::Internal("actor task is no longer running".to_string())
}

impl<M: Machine> ActorHandle<M> {
    /// Spawns the backing Tokio task and returns a handle to it. The
    /// task is idle (pre-`spawn`) until the first [`ActorHandle::spawn`]
    /// call.
    pub fn spawn_task<S: SnapshotStore, C: Clock>(
        store: Arc<S>,
        clock: C,
        cache_ttl: Duration,
        persist_debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run_actor_loop::<M, S, C>(rx, store, clock, cache_ttl, persist_debounce));
        ActorHandle { tx }
    }

    /// Idempotent first-time construction (spec §4.4 `spawn`).
    pub async fn spawn(
        &self,
        actor_type: impl Into<String>,
        actor_id: impl Into<String>,
        initial_caller: Caller,
        input: M::Input,
    ) -> Result<(), HostError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Spawn { actor_type: actor_type.into(), actor_id: actor_id.into(), initial_caller, input, reply })
            .await
            .map_err(channel_closed)?;
        rx.await.map_err(channel_closed)?
    }

    /// Enqueues an already-validated, caller-stamped event (spec §4.4
    /// `send`). Schema validation is the router's job — by the time an
    /// `Event` reaches here it is trusted.
    pub async fn send(&self, event: Event) -> Result<(), HostError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Send { event, reply }).await.map_err(channel_closed)?;
        rx.await.map_err(channel_closed)?
    }

    /// Returns a caller's projection, optionally blocking until `wait`
    /// is satisfied or times out (spec §4.4 `getSnapshot`).
    pub async fn get_snapshot(
        &self,
        caller_id: impl Into<String>,
        wait: Option<WaitFor>,
    ) -> Result<GetSnapshotResult<M::Public, M::Private, M::Value>, HostError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::GetSnapshot { caller_id: caller_id.into(), wait, reply }).await.map_err(channel_closed)?;
        rx.await.map_err(channel_closed)?
    }

    /// Registers a subscription and performs the initial resync (spec
    /// §4.4 `connect`).
    pub async fn connect(&self, caller: Caller, baseline_checksum: Option<Checksum>) -> Result<ConnectResult, HostError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Connect { caller, baseline_checksum, reply }).await.map_err(channel_closed)?;
        rx.await.map_err(channel_closed)?
    }

    /// Detaches a subscription, surfacing `DISCONNECT` to the machine.
    /// Best-effort: if the task is already gone there is nothing left
    /// to disconnect from.
    pub fn disconnect(&self, subscription_id: Uuid) {
        let _ = self.tx.try_send(Command::Disconnect { subscription_id });
    }

    /// Forces a pending persistence write to flush, for graceful
    /// shutdown (SPEC_FULL.md §11).
    pub async fn flush(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Flush { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }
}

struct ActorState<M: Machine, S: SnapshotStore, C: Clock> {
    identity: Option<(String, String)>,
    machine: Option<M>,
    subscribers: HashMap<Uuid, Subscriber<M::Public, M::Private, M::Value>>,
    cache: SnapshotCache<C>,
    last_checksum: Option<Checksum>,
    last_full_snapshot: Option<Value>,
    last_persisted_value: Option<Value>,
    dirty: bool,
    last_persist_at: Instant,
    persist_retry_count: u32,
    persist_retry_at: Option<Instant>,
    waiters: Vec<Waiter<M>>,
    store: Arc<S>,
    clock: C,
    persist_debounce: Duration,
}

async fn run_actor_loop<M: Machine, S: SnapshotStore, C: Clock>(
    mut rx: mpsc::Receiver<Command<M>>,
    store: Arc<S>,
    clock: C,
    cache_ttl: Duration,
    persist_debounce: Duration,
) {
    let mut state = ActorState::<M, S, C> {
        identity: None,
        machine: None,
        subscribers: HashMap::new(),
        cache: SnapshotCache::new(cache_ttl, clock.clone()),
        last_checksum: None,
        last_full_snapshot: None,
        last_persisted_value: None,
        dirty: false,
        last_persist_at: clock.now(),
        persist_retry_count: 0,
        persist_retry_at: None,
        waiters: Vec::new(),
        store,
        clock,
        persist_debounce,
    };

    loop {
        let next_deadline = state.waiters.iter().map(|w| w.deadline).min();
        let has_deadline = next_deadline.is_some();
        let sleep = tokio::time::sleep_until(next_deadline.unwrap_or_else(TokioInstant::now));
        tokio::pin!(sleep);

        tokio::select! {
            maybe_cmd = rx.recv() => {
                match maybe_cmd {
                    Some(cmd) => handle_command(&mut state, cmd).await,
                    None => break,
                }
            }
            _ = &mut sleep, if has_deadline => {
                resolve_timed_out_waiters(&mut state);
            }
        }
    }

    if let Some((actor_type, actor_id)) = state.identity.clone() {
        debug!(actor_type, actor_id, "actor task loop exiting");
    }
}

async fn handle_command<M: Machine, S: SnapshotStore, C: Clock>(state: &mut ActorState<M, S, C>, cmd: Command<M>) {
    match cmd {
        Command::Spawn { actor_type, actor_id, initial_caller, input, reply } => {
            let result = handle_spawn(state, actor_type, actor_id, initial_caller, input).await;
            let _ = reply.send(result);
        }
        Command::Send { event, reply } => {
            let result = handle_send(state, event).await;
            let _ = reply.send(result);
        }
        Command::GetSnapshot { caller_id, wait, reply } => {
            handle_get_snapshot(state, caller_id, wait, reply);
        }
        Command::Connect { caller, baseline_checksum, reply } => {
            let result = handle_connect(state, caller, baseline_checksum).await;
            let _ = reply.send(result);
        }
        Command::Disconnect { subscription_id } => {
            handle_disconnect(state, subscription_id).await;
        }
        Command::Flush { reply } => {
            maybe_persist(state, true).await;
            let _ = reply.send(());
        }
    }
}

async fn handle_spawn<M: Machine, S: SnapshotStore, C: Clock>(
    state: &mut ActorState<M, S, C>,
    actor_type: String,
    actor_id: String,
    initial_caller: Caller,
    input: M::Input,
) -> Result<(), HostError> {
    if let Some((ty, id)) = &state.identity {
        if *ty == actor_type && *id == actor_id {
            return Ok(());
        }
        return Err(HostError::AlreadySpawnedDifferent { actor: format!("{actor_type}/{actor_id}") });
    }

    let existing_meta = state.store.load_meta(&actor_type, &actor_id).await?;
    let persisted = state.store.load(&actor_type, &actor_id).await?;

    let (machine, event_kind) = match persisted {
        Some(p) => {
            let migration_ops = M::migration_ops(&p.state);
            let migrated = if migration_ops.is_empty() {
                p.state
            } else {
                ak_patch::apply(&p.state, &migration_ops).map_err(|e| HostError::Internal(e.to_string()))?
            };
            let snapshot: Snapshot<M::Public, M::Private, M::Value> =
                serde_json::from_value(migrated).map_err(|e| HostError::Internal(e.to_string()))?;
            (M::restore(snapshot, initial_caller.clone(), input.clone()), SystemEventKind::Resume)
        }
        None => (M::start(initial_caller.clone(), input.clone()), SystemEventKind::Initialize),
    };

    if existing_meta.is_none() {
        let meta = ActorMeta {
            actor_type: actor_type.clone(),
            actor_id: actor_id.clone(),
            initial_caller: serde_json::to_value(&initial_caller).map_err(|e| HostError::Internal(e.to_string()))?,
            input: serde_json::to_value(&input).map_err(|e| HostError::Internal(e.to_string()))?,
        };
        state.store.save_meta(&meta).await?;
    }

    info!(actor_type = %actor_type, actor_id = %actor_id, event = ?event_kind, "actor spawned");
    state.identity = Some((actor_type.clone(), actor_id.clone()));

    let sys_event = Event::system(event_kind, Caller::system(actor_id));
    let mut machine = machine;
    let dirty = step_machine(&mut machine, &sys_event);
    state.machine = Some(machine);
    if dirty {
        post_step(state, &sys_event).await;
    }

    Ok(())
}

async fn handle_send<M: Machine, S: SnapshotStore, C: Clock>(state: &mut ActorState<M, S, C>, event: Event) -> Result<(), HostError> {
    let Some(machine) = state.machine.as_mut() else {
        return Err(HostError::NotReady);
    };
    if step_machine(machine, &event) {
        post_step(state, &event).await;
    }
    Ok(())
}

fn handle_get_snapshot<M: Machine, S: SnapshotStore, C: Clock>(
    state: &mut ActorState<M, S, C>,
    caller_id: String,
    wait: Option<WaitFor>,
    reply: SnapshotReply<M>,
) {
    let Some(machine) = state.machine.as_ref() else {
        let _ = reply.send(Err(HostError::NotReady));
        return;
    };

    let Some(wait) = wait else {
        let _ = reply.send(Ok(current_result(state, machine, &caller_id)));
        return;
    };

    let value_json = serde_json::to_value(&machine.get_snapshot().value).unwrap_or(Value::Null);
    let already_satisfied = wait.state.as_ref().is_some_and(|target| *target == value_json);
    if already_satisfied {
        let _ = reply.send(Ok(current_result(state, machine, &caller_id)));
        return;
    }

    let deadline = TokioInstant::now() + wait.timeout;
    state.waiters.push(Waiter { condition: wait, caller_id, deadline, reply: Some(reply) });
}

fn current_result<M: Machine, S: SnapshotStore, C: Clock>(
    state: &ActorState<M, S, C>,
    machine: &M,
    caller_id: &str,
) -> GetSnapshotResult<M::Public, M::Private, M::Value> {
    let snapshot = machine.get_snapshot();
    let checksum = state.last_checksum.clone().unwrap_or_else(|| fallback_checksum(&snapshot));
    GetSnapshotResult { snapshot: project(&snapshot, caller_id), checksum }
}

fn fallback_checksum<P: serde::Serialize, Pr: serde::Serialize, V: serde::Serialize>(snapshot: &Snapshot<P, Pr, V>) -> Checksum {
    ak_patch::checksum_of(snapshot).unwrap_or_else(|_| Checksum::from(String::new()))
}

async fn handle_connect<M: Machine, S: SnapshotStore, C: Clock>(
    state: &mut ActorState<M, S, C>,
    caller: Caller,
    baseline_checksum: Option<Checksum>,
) -> Result<ConnectResult, HostError> {
    let Some(machine) = state.machine.as_ref() else {
        return Err(HostError::NotReady);
    };

    let snapshot = machine.get_snapshot();
    let current_checksum = state.last_checksum.clone().unwrap_or_else(|| fallback_checksum(&snapshot));
    let current_projection = project(&snapshot, &caller.id);
    let current_projection_json = serde_json::to_value(&current_projection).unwrap_or(Value::Null);

    let initial_patch = resolve_initial_resync(state, &baseline_checksum, &current_checksum, &caller.id, &current_projection_json);

    let (patch_tx, patch_rx) = mpsc::channel(SUBSCRIBER_BUFFER);
    let (close_tx, close_rx) = mpsc::unbounded_channel();
    let subscription_id = Uuid::new_v4();
    state.subscribers.insert(
        subscription_id,
        Subscriber { id: subscription_id, caller: caller.clone(), last_projection: current_projection, sender: patch_tx, close_tx },
    );

    let Some((_, actor_id)) = state.identity.clone() else {
        return Err(HostError::NotReady);
    };
    let connect_event = Event::system(SystemEventKind::Connect { connecting_caller: caller }, Caller::system(actor_id));
    let Some(machine) = state.machine.as_mut() else {
        return Err(HostError::NotReady);
    };
    if step_machine(machine, &connect_event) {
        post_step(state, &connect_event).await;
    }

    Ok(ConnectResult { subscription_id, patch_receiver: patch_rx, close_receiver: close_rx, initial_patch })
}

/// Spec §4.4 "Initial resync on upgrade": matching checksum sends
/// nothing, a cached baseline sends a diff from that baseline, and an
/// unknown baseline sends a full replace (`diff({}, projection)`) — the
/// self-healing invariant.
fn resolve_initial_resync<M: Machine, S: SnapshotStore, C: Clock>(
    state: &ActorState<M, S, C>,
    baseline_checksum: &Option<Checksum>,
    current_checksum: &Checksum,
    caller_id: &str,
    current_projection_json: &Value,
) -> Option<Patch> {
    match baseline_checksum {
        Some(cs) if cs == current_checksum => None,
        Some(cs) => {
            let baseline_projection = state.cache.get(cs).and_then(|raw| decode_cached_projection::<M>(raw, caller_id));
            let from = baseline_projection.unwrap_or_else(|| json!({}));
            Some(Patch { operations: ak_patch::diff(&from, current_projection_json), checksum: current_checksum.clone() })
        }
        None => Some(Patch { operations: ak_patch::diff(&json!({}), current_projection_json), checksum: current_checksum.clone() }),
    }
}

/// The cache stores full snapshots keyed by checksum (spec §3
/// `SnapshotCache`); re-derive the caller's slice of the cached
/// baseline the same way [`project`] derives it from the live snapshot.
fn decode_cached_projection<M: Machine>(cached_raw: &Value, caller_id: &str) -> Option<Value> {
    let snapshot: Snapshot<M::Public, M::Private, M::Value> = serde_json::from_value(cached_raw.clone()).ok()?;
    let projection = project(&snapshot, caller_id);
    Some(snapshot_proj_to_value(&projection))
}

fn snapshot_to_value<P: serde::Serialize, Pr: serde::Serialize, V: serde::Serialize>(snapshot: &Snapshot<P, Pr, V>) -> Value {
    serde_json::to_value(snapshot).unwrap_or(Value::Null)
}

async fn handle_disconnect<M: Machine, S: SnapshotStore, C: Clock>(state: &mut ActorState<M, S, C>, subscription_id: Uuid) {
    let Some(sub) = state.subscribers.remove(&subscription_id) else {
        return;
    };
    let Some((_, actor_id)) = state.identity.clone() else {
        return;
    };
    let Some(machine) = state.machine.as_mut() else {
        return;
    };
    let event = Event::system(SystemEventKind::Disconnect { disconnecting_caller: sub.caller }, Caller::system(actor_id));
    if step_machine(machine, &event) {
        post_step(state, &event).await;
    }
}

/// One `send` to the machine (spec §4.4 "single logical executor"). On
/// failure, logs and leaves state untouched — spec §4.4(ii) — and the
/// caller must not run the post-step routine.
fn step_machine<M: Machine>(machine: &mut M, event: &Event) -> bool {
    match machine.send(event) {
        Ok(()) => true,
        Err(e) => {
            warn!(event_type = %event.event_type, error = %e, "machine rejected event, dropping");
            false
        }
    }
}

/// Spec §4.4 "Post-step routine": capture + cache the new snapshot,
/// resolve any satisfied waiters, fan out deltas to subscribers, and
/// persist if the snapshot changed.
async fn post_step<M: Machine, S: SnapshotStore, C: Clock>(state: &mut ActorState<M, S, C>, event: &Event) {
    let Some(machine) = state.machine.as_ref() else { return };
    let snapshot = machine.get_snapshot();
    let full_value = snapshot_to_value(&snapshot);
    let checksum = fallback_checksum(&snapshot);

    state.cache.insert(checksum.clone(), full_value.clone());
    state.cache.evict_expired();
    state.last_checksum = Some(checksum.clone());
    state.last_full_snapshot = Some(full_value.clone());

    resolve_matching_waiters(state, event, &snapshot, &checksum);
    fan_out(state, &snapshot, &checksum);

    if state.last_persisted_value.as_ref() != Some(&full_value) {
        state.dirty = true;
    }
    maybe_persist(state, false).await;
}

fn resolve_matching_waiters<M: Machine, S: SnapshotStore, C: Clock>(
    state: &mut ActorState<M, S, C>,
    event: &Event,
    snapshot: &Snapshot<M::Public, M::Private, M::Value>,
    checksum: &Checksum,
) {
    let value_json = serde_json::to_value(&snapshot.value).unwrap_or(Value::Null);
    let mut i = 0;
    while i < state.waiters.len() {
        let matches = {
            let w = &state.waiters[i];
            let event_match = w.condition.event_type.as_deref().is_some_and(|t| t == event.event_type);
            let state_match = w.condition.state.as_ref().is_some_and(|target| *target == value_json);
            event_match || state_match
        };
        if matches {
            let mut waiter = state.waiters.remove(i);
            if let Some(reply) = waiter.reply.take() {
                let projection = project(snapshot, &waiter.caller_id);
                let _ = reply.send(Ok(GetSnapshotResult { snapshot: projection, checksum: checksum.clone() }));
            }
        } else {
            i += 1;
        }
    }
}

fn resolve_timed_out_waiters<M: Machine, S: SnapshotStore, C: Clock>(state: &mut ActorState<M, S, C>) {
    let now = TokioInstant::now();
    let mut i = 0;
    while i < state.waiters.len() {
        if state.waiters[i].deadline <= now {
            let mut waiter = state.waiters.remove(i);
            let Some(reply) = waiter.reply.take() else { continue };
            if waiter.condition.error_on_timeout {
                let _ = reply.send(Err(HostError::WaitTimeout));
            } else if let Some(machine) = state.machine.as_ref() {
                let _ = reply.send(Ok(current_result(state, machine, &waiter.caller_id)));
            } else {
                let _ = reply.send(Err(HostError::NotReady));
            }
        } else {
            i += 1;
        }
    }
}

fn fan_out<M: Machine, S: SnapshotStore, C: Clock>(
    state: &mut ActorState<M, S, C>,
    snapshot: &Snapshot<M::Public, M::Private, M::Value>,
    checksum: &Checksum,
) {
    let mut dead = Vec::new();
    for (id, sub) in state.subscribers.iter_mut() {
        let next = project(snapshot, &sub.caller.id);
        let prev_json = snapshot_proj_to_value(&sub.last_projection);
        let next_json = snapshot_proj_to_value(&next);
        let ops: Vec<PatchOperation> = ak_patch::diff(&prev_json, &next_json);
        if !ops.is_empty() {
            let patch = Patch { operations: ops, checksum: checksum.clone() };
            match sub.sender.try_send(patch) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscription = %id, "subscriber patch queue full, closing with resync required");
                    let _ = sub.close_tx.send(CloseReason::ResyncRequired);
                    dead.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
            }
        }
        sub.last_projection = next;
    }
    for id in dead {
        state.subscribers.remove(&id);
    }
}

fn snapshot_proj_to_value<P: serde::Serialize, Pr: serde::Serialize, V: serde::Serialize>(proj: &CallerSnapshot<P, Pr, V>) -> Value {
    serde_json::to_value(proj).unwrap_or(Value::Null)
}

/// Spec §4.4(iv): never block the loop on a persistence failure; retry
/// on a later step with exponential backoff up to [`PERSIST_BACKOFF_MAX`].
async fn maybe_persist<M: Machine, S: SnapshotStore, C: Clock>(state: &mut ActorState<M, S, C>, force: bool) {
    if !state.dirty {
        return;
    }
    let now = state.clock.now();
    if !force && now.duration_since(state.last_persist_at) < state.persist_debounce {
        return;
    }
    if !force {
        if let Some(retry_at) = state.persist_retry_at {
            if now < retry_at {
                return;
            }
        }
    }
    let Some((actor_type, actor_id)) = state.identity.clone() else { return };
    let Some(full_value) = state.last_full_snapshot.clone() else { return };

    let persisted = PersistedSnapshot { version: 0, state: full_value.clone(), created_at: chrono::Utc::now() };
    match state.store.save(&actor_type, &actor_id, &persisted).await {
        Ok(()) => {
            state.last_persisted_value = Some(full_value);
            state.dirty = false;
            state.last_persist_at = now;
            state.persist_retry_count = 0;
            state.persist_retry_at = None;
        }
        Err(e) => {
            state.persist_retry_count = (state.persist_retry_count + 1).min(MAX_PERSIST_RETRY_EXP);
            let backoff = (PERSIST_BACKOFF_BASE * 2u32.pow(state.persist_retry_count)).min(PERSIST_BACKOFF_MAX);
            state.persist_retry_at = Some(now + backoff);
            error!(actor_id = %actor_id, error = %e, backoff_ms = backoff.as_millis() as u64, "failed to persist snapshot, will retry");
        }
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
