// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ak_core::CallerSnapshot;
use ak_patch::{Checksum, PatchOperation};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch, Notify};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::ClientError;

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 1_000;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Called on every successfully applied patch, with the new projected
/// snapshot (spec §4.7 `onStateChange`).
pub type StateListener<P, Pr, V> = Arc<dyn Fn(&CallerSnapshot<P, Pr, V>) + Send + Sync>;
/// Called on transport and patch-application failures (spec §4.7 `onError`).
pub type ErrorListener = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Bound on `P`/`Pr`/`V` shared by every slot a client-projected
/// snapshot flows through: the local baseline the patch stream is
/// applied against, the `watch` channel `waitFor` polls, and the
/// values handed to subscriber callbacks.
pub trait Projection: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
impl<T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static> Projection for T {}

/// Everything needed to open a connection (spec §4.7 `connect(config)`).
pub struct ClientConfig<P, Pr, V> {
    pub host: String,
    pub actor_type: String,
    pub actor_id: String,
    pub access_token: String,
    /// Baseline checksum to resume from, typically the one returned by
    /// a prior GET (spec §4.6/§6). `None` asks the host for a fresh one.
    pub checksum: Option<Checksum>,
    pub initial_snapshot: CallerSnapshot<P, Pr, V>,
    pub on_state_change: Option<StateListener<P, Pr, V>>,
    pub on_error: Option<ErrorListener>,
}

#[derive(Debug, Deserialize)]
struct WirePatch {
    operations: Vec<PatchOperation>,
    checksum: Checksum,
}

struct Inner<P, Pr, V> {
    host: String,
    actor_type: String,
    actor_id: String,
    access_token: String,
    checksum: Mutex<Option<Checksum>>,
    current_value: Mutex<Value>,
    current_snapshot: Mutex<CallerSnapshot<P, Pr, V>>,
    snapshot_tx: watch::Sender<CallerSnapshot<P, Pr, V>>,
    listeners: Mutex<Vec<(u64, StateListener<P, Pr, V>)>>,
    next_listener_id: AtomicU64,
    on_error: Option<ErrorListener>,
    outbound_tx: mpsc::UnboundedSender<Message>,
    is_open: AtomicBool,
    shutdown: AtomicBool,
    shutdown_notify: Notify,
}

impl<P, Pr, V> Inner<P, Pr, V> {
    fn notify_listeners(&self, snapshot: &CallerSnapshot<P, Pr, V>) {
        for (_, listener) in self.listeners.lock().iter() {
            listener(snapshot);
        }
    }

    fn emit_error(&self, err: ClientError) {
        warn!(error = %err, "ak-client error");
        if let Some(cb) = &self.on_error {
            cb(&err);
        }
    }
}

/// A live, reconnecting WebSocket connection to one actor, projecting a
/// local `CallerSnapshot<P, Pr, V>` from the host's patch stream
/// (spec §4.7). Grounded in the teacher's `oj-daemon` Docker event
/// bridge (`adapters::agent::docker::ws`): a `tokio::select!` loop over
/// an inbound stream and an outbound command channel, owned by one
/// background task per connection.
pub struct ActorClient<P: Projection, Pr: Projection, V: Projection> {
    inner: Arc<Inner<P, Pr, V>>,
}

impl<P: Projection, Pr: Projection, V: Projection> ActorClient<P, Pr, V> {
    /// Opens the connection and spawns the background reconnect loop.
    /// Returns immediately; `config.initial_snapshot` is visible via
    /// [`Self::snapshot`] until the first patch arrives.
    pub fn connect(config: ClientConfig<P, Pr, V>) -> Self {
        let ClientConfig { host, actor_type, actor_id, access_token, checksum, initial_snapshot, on_state_change, on_error } =
            config;

        let current_value = serde_json::to_value(&initial_snapshot).unwrap_or(Value::Null);
        let (snapshot_tx, _) = watch::channel(initial_snapshot.clone());
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let mut listeners = Vec::new();
        if let Some(listener) = on_state_change {
            listeners.push((0, listener));
        }

        let inner = Arc::new(Inner {
            host,
            actor_type,
            actor_id,
            access_token,
            checksum: Mutex::new(checksum),
            current_value: Mutex::new(current_value),
            current_snapshot: Mutex::new(initial_snapshot),
            snapshot_tx,
            listeners: Mutex::new(listeners),
            next_listener_id: AtomicU64::new(1),
            on_error,
            outbound_tx,
            is_open: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        });

        tokio::spawn(run(Arc::clone(&inner), outbound_rx));
        Self { inner }
    }

    /// The most recently projected snapshot.
    pub fn snapshot(&self) -> CallerSnapshot<P, Pr, V> {
        self.inner.current_snapshot.lock().clone()
    }

    /// Sends an event to the actor (spec §4.7 `send(event)`). `event`
    /// must be a JSON object carrying at least a `type` field, the same
    /// wire shape [`ak_core::Event::from_wire`] expects on the server
    /// side. Writes without queueing if the socket is not open.
    pub fn send(&self, event: Value) -> Result<(), ClientError> {
        if !self.inner.is_open.load(Ordering::SeqCst) {
            self.inner.emit_error(ClientError::NotConnected);
            return Err(ClientError::NotConnected);
        }
        let text = event.to_string();
        self.inner.outbound_tx.send(Message::Text(text)).map_err(|_| ClientError::NotConnected)
    }

    /// Registers a listener invoked on every applied patch. The
    /// returned [`Subscription`] must be kept (or explicitly
    /// unsubscribed) — dropping it without calling
    /// [`Subscription::unsubscribe`] leaves the listener registered,
    /// matching a plain function reference never being revoked
    /// (spec §4.7 `subscribe(listener) -> unsubscribe`).
    pub fn subscribe(&self, listener: StateListener<P, Pr, V>) -> Subscription<P, Pr, V> {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, listener));
        Subscription { inner: Arc::clone(&self.inner), id }
    }

    /// Resolves as soon as `predicate` matches the current or any
    /// future snapshot, or fails with [`ClientError::WaitTimeout`]
    /// after `timeout` (spec §4.7 `waitFor(predicate, timeoutMs=5000)`).
    pub async fn wait_for<F>(&self, mut predicate: F, timeout: Duration) -> Result<CallerSnapshot<P, Pr, V>, ClientError>
    where
        F: FnMut(&CallerSnapshot<P, Pr, V>) -> bool,
    {
        let current = self.inner.current_snapshot.lock().clone();
        if predicate(&current) {
            return Ok(current);
        }

        let mut rx = self.inner.snapshot_tx.subscribe();
        let poll = async {
            loop {
                if rx.changed().await.is_err() {
                    return Err(ClientError::NotConnected);
                }
                let snapshot = rx.borrow_and_update().clone();
                if predicate(&snapshot) {
                    return Ok(snapshot);
                }
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| ClientError::WaitTimeout)?
    }

    /// Closes the connection and stops reconnecting.
    pub fn disconnect(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        self.inner.shutdown_notify.notify_waiters();
    }
}

/// A registered listener, revocable with [`Subscription::unsubscribe`].
pub struct Subscription<P, Pr, V> {
    inner: Arc<Inner<P, Pr, V>>,
    id: u64,
}

impl<P, Pr, V> Subscription<P, Pr, V> {
    pub fn unsubscribe(self) {
        self.inner.listeners.lock().retain(|(id, _)| *id != self.id);
    }
}

/// The connection's whole lifetime: connect, pump messages, and on any
/// disconnect retry with exponential backoff capped at
/// [`MAX_RECONNECT_ATTEMPTS`] attempts (spec §4.7).
async fn run<P: Projection, Pr: Projection, V: Projection>(
    inner: Arc<Inner<P, Pr, V>>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
) {
    let mut attempt: u32 = 0;

    loop {
        if inner.shutdown.load(Ordering::SeqCst) {
            return;
        }

        let checksum = inner.checksum.lock().clone();
        let url = match crate::build_ws_url(&inner.host, &inner.actor_type, &inner.actor_id, &inner.access_token, checksum.as_ref().map(Checksum::as_str)) {
            Ok(url) => url,
            Err(e) => {
                inner.emit_error(ClientError::Transport(e.to_string()));
                return;
            }
        };

        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                attempt = 0;
                inner.is_open.store(true, Ordering::SeqCst);
                let (mut sink, mut source) = stream.split();

                loop {
                    tokio::select! {
                        biased;
                        _ = inner.shutdown_notify.notified() => {
                            inner.is_open.store(false, Ordering::SeqCst);
                            let _ = sink.close().await;
                            return;
                        }
                        incoming = source.next() => {
                            match incoming {
                                Some(Ok(Message::Text(text))) => {
                                    if apply_incoming(&inner, &text).is_err() {
                                        inner.emit_error(ClientError::PatchFailed);
                                        break;
                                    }
                                }
                                Some(Ok(Message::Close(frame))) => {
                                    debug!(?frame, "actor closed the websocket");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    warn!(error = %e, "websocket read error");
                                    break;
                                }
                                None => break,
                            }
                        }
                        outbound = outbound_rx.recv() => {
                            match outbound {
                                Some(msg) => {
                                    if sink.send(msg).await.is_err() {
                                        break;
                                    }
                                }
                                None => return,
                            }
                        }
                    }
                }
                inner.is_open.store(false, Ordering::SeqCst);
            }
            Err(e) => {
                inner.emit_error(ClientError::Transport(e.to_string()));
            }
        }

        if inner.shutdown.load(Ordering::SeqCst) {
            return;
        }

        attempt += 1;
        if attempt > MAX_RECONNECT_ATTEMPTS {
            inner.emit_error(ClientError::ReconnectExhausted);
            return;
        }

        let backoff_ms = INITIAL_BACKOFF_MS.saturating_mul(1u64 << (attempt - 1)).min(MAX_BACKOFF_MS);
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
    }
}

/// Applies one `{ operations, checksum }` message to the local
/// baseline and publishes the result. Returns `Err` when the patch
/// does not apply against what we hold — the caller must reconnect and
/// resync from the host's current checksum rather than retry.
fn apply_incoming<P: Projection, Pr: Projection, V: Projection>(inner: &Inner<P, Pr, V>, text: &str) -> Result<(), ()> {
    let wire: WirePatch = serde_json::from_str(text).map_err(|_| ())?;

    let mut current_value = inner.current_value.lock();
    let applied = ak_patch::apply(&current_value, &wire.operations).map_err(|_| ())?;
    let snapshot: CallerSnapshot<P, Pr, V> = serde_json::from_value(applied.clone()).map_err(|_| ())?;
    *current_value = applied;
    drop(current_value);

    *inner.checksum.lock() = Some(wire.checksum);
    *inner.current_snapshot.lock() = snapshot.clone();
    let _ = inner.snapshot_tx.send(snapshot.clone());
    inner.notify_listeners(&snapshot);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ak_patch::diff;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    fn snapshot(todos: Value) -> CallerSnapshot<Value, Value, Value> {
        CallerSnapshot { public: json!({"todos": todos}), private: json!({}), value: json!("Ready") }
    }

    fn make_inner(initial: CallerSnapshot<Value, Value, Value>) -> (Arc<Inner<Value, Value, Value>>, mpsc::UnboundedReceiver<Message>) {
        let current_value = serde_json::to_value(&initial).unwrap();
        let (snapshot_tx, _) = watch::channel(initial.clone());
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            host: "localhost:8080".to_string(),
            actor_type: "todo".to_string(),
            actor_id: "L1".to_string(),
            access_token: "tok".to_string(),
            checksum: Mutex::new(None),
            current_value: Mutex::new(current_value),
            current_snapshot: Mutex::new(initial),
            snapshot_tx,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            on_error: None,
            outbound_tx,
            is_open: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        });
        (inner, outbound_rx)
    }

    fn backoff_for(attempt: u32) -> u64 {
        INITIAL_BACKOFF_MS.saturating_mul(1u64 << (attempt - 1)).min(MAX_BACKOFF_MS)
    }

    #[yare::parameterized(
        first   = { 1, 1_000 },
        second  = { 2, 2_000 },
        third   = { 3, 4_000 },
        fourth  = { 4, 8_000 },
        fifth   = { 5, 16_000 },
    )]
    fn reconnect_backoff_matches_exponential_policy(attempt: u32, expected_ms: u64) {
        assert_eq!(backoff_for(attempt), expected_ms);
    }

    #[test]
    fn apply_incoming_updates_snapshot_and_checksum() {
        let (inner, _rx) = make_inner(snapshot(json!([])));
        let prev = serde_json::to_value(&snapshot(json!([]))).unwrap();
        let next = serde_json::to_value(&snapshot(json!([{"id": "1", "text": "buy milk"}]))).unwrap();
        let ops = diff(&prev, &next);
        let checksum = ak_patch::checksum_of(&next).unwrap();
        let wire = json!({"operations": ops, "checksum": checksum.as_str()}).to_string();

        apply_incoming::<Value, Value, Value>(&inner, &wire).unwrap();

        assert_eq!(inner.current_snapshot.lock().public["todos"][0]["text"], "buy milk");
        assert_eq!(inner.checksum.lock().as_ref().unwrap().as_str(), checksum.as_str());
    }

    #[test]
    fn apply_incoming_rejects_patch_against_stale_baseline() {
        let (inner, _rx) = make_inner(snapshot(json!([])));
        let other_prev = json!({"public": {"todos": [{"id": "x", "text": "unrelated"}]}, "private": {}, "value": "Ready"});
        let next = json!({"public": {"todos": [{"id": "x", "text": "changed"}]}, "private": {}, "value": "Ready"});
        let ops = diff(&other_prev, &next);
        let wire = json!({"operations": ops, "checksum": "deadbeef"}).to_string();

        assert!(apply_incoming::<Value, Value, Value>(&inner, &wire).is_err());
    }

    #[test]
    fn subscribe_then_unsubscribe_stops_future_notifications() {
        let (inner, _rx) = make_inner(snapshot(json!([])));
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = 7;
        inner.listeners.lock().push((id, Arc::new(move |_: &CallerSnapshot<Value, Value, Value>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        })));

        let next = serde_json::to_value(&snapshot(json!([{"id": "1", "text": "a"}]))).unwrap();
        let prev = serde_json::to_value(&snapshot(json!([]))).unwrap();
        let ops = diff(&prev, &next);
        let checksum = ak_patch::checksum_of(&next).unwrap();
        let wire = json!({"operations": ops, "checksum": checksum.as_str()}).to_string();
        apply_incoming::<Value, Value, Value>(&inner, &wire).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        inner.listeners.lock().retain(|(lid, _)| *lid != id);
        apply_incoming::<Value, Value, Value>(&inner, &wire).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
