// SPDX-License-Identifier: MIT

//! ak-client-mock: C8, an in-memory test double sharing C7's outward
//! surface (`connect`/`disconnect`/`send`/`snapshot`/`subscribe`/
//! `wait_for`) plus `produce`, for test harnesses that want to drive a
//! consumer's reaction to state changes without a host or a socket
//! (spec §4.8).
//!
//! Deliberately has no dependency on `ak-client` or `tokio`: a test
//! double earns its keep by being simpler than the real thing, not by
//! sharing its machinery. `connect`/`disconnect` are no-ops; `send`
//! records into an `on_send` hook instead of going over the wire;
//! `wait_for` blocks the calling thread on a condition variable rather
//! than awaiting a `watch` channel, since there is no background task
//! to hand the wake-up to.

mod error;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ak_core::CallerSnapshot;
use parking_lot::{Condvar, Mutex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use error::MockClientError;

pub type StateListener<P, Pr, V> = Arc<dyn Fn(&CallerSnapshot<P, Pr, V>) + Send + Sync>;
pub type SendListener = Arc<dyn Fn(&Value) + Send + Sync>;

pub trait Projection: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
impl<T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static> Projection for T {}

pub struct MockClientConfig<P, Pr, V> {
    pub initial_snapshot: CallerSnapshot<P, Pr, V>,
    pub on_send: Option<SendListener>,
}

struct Inner<P, Pr, V> {
    snapshot: Mutex<CallerSnapshot<P, Pr, V>>,
    changed: Condvar,
    listeners: Mutex<Vec<(u64, StateListener<P, Pr, V>)>>,
    next_listener_id: AtomicU64,
    on_send: Option<SendListener>,
    sent: Mutex<Vec<Value>>,
}

impl<P, Pr, V> Inner<P, Pr, V> {
    fn notify_listeners(&self, snapshot: &CallerSnapshot<P, Pr, V>) {
        for (_, listener) in self.listeners.lock().iter() {
            listener(snapshot);
        }
    }
}

/// C8: same outward surface as [`ActorClient`](https://docs.rs/ak-client),
/// minus the network.
pub struct MockActorClient<P: Projection, Pr: Projection, V: Projection> {
    inner: Arc<Inner<P, Pr, V>>,
}

impl<P: Projection, Pr: Projection, V: Projection> MockActorClient<P, Pr, V> {
    pub fn new(config: MockClientConfig<P, Pr, V>) -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot: Mutex::new(config.initial_snapshot),
                changed: Condvar::new(),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(1),
                on_send: config.on_send,
                sent: Mutex::new(Vec::new()),
            }),
        }
    }

    /// No-op (spec §4.8): there is no socket to open.
    pub fn connect(&self) {}

    /// No-op (spec §4.8): there is no socket to close.
    pub fn disconnect(&self) {}

    pub fn snapshot(&self) -> CallerSnapshot<P, Pr, V> {
        self.inner.snapshot.lock().clone()
    }

    /// Records `event` and forwards it to `on_send`, standing in for
    /// the real client's wire write (spec §4.8 "`send` records into an
    /// `on_send` hook").
    pub fn send(&self, event: Value) {
        self.inner.sent.lock().push(event.clone());
        if let Some(on_send) = &self.inner.on_send {
            on_send(&event);
        }
    }

    /// Every event recorded by [`Self::send`] so far, in call order.
    pub fn sent_events(&self) -> Vec<Value> {
        self.inner.sent.lock().clone()
    }

    pub fn subscribe(&self, listener: StateListener<P, Pr, V>) -> Subscription<P, Pr, V> {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, listener));
        Subscription { inner: Arc::clone(&self.inner), id }
    }

    /// Applies `recipe` in place to the local snapshot and notifies
    /// subscribers, the way a real patch application would (spec §4.8
    /// `produce(recipe)`), without computing or shipping any patch.
    pub fn produce<F>(&self, recipe: F)
    where
        F: FnOnce(&mut CallerSnapshot<P, Pr, V>),
    {
        let mut guard = self.inner.snapshot.lock();
        recipe(&mut guard);
        let updated = guard.clone();
        drop(guard);
        self.inner.changed.notify_all();
        self.inner.notify_listeners(&updated);
    }

    /// Blocks the calling thread until `predicate` matches the current
    /// or a future snapshot, or returns [`MockClientError::WaitTimeout`]
    /// after `timeout` (spec §4.8 `wait_for`).
    pub fn wait_for<F>(&self, mut predicate: F, timeout: Duration) -> Result<CallerSnapshot<P, Pr, V>, MockClientError>
    where
        F: FnMut(&CallerSnapshot<P, Pr, V>) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.snapshot.lock();
        loop {
            if predicate(&guard) {
                return Ok(guard.clone());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MockClientError::WaitTimeout);
            }
            let timed_out = self.inner.changed.wait_for(&mut guard, remaining).timed_out();
            if timed_out && !predicate(&guard) {
                return Err(MockClientError::WaitTimeout);
            }
        }
    }
}

pub struct Subscription<P, Pr, V> {
    inner: Arc<Inner<P, Pr, V>>,
    id: u64,
}

impl<P, Pr, V> Subscription<P, Pr, V> {
    pub fn unsubscribe(self) {
        self.inner.listeners.lock().retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    fn client() -> MockActorClient<Value, Value, Value> {
        MockActorClient::new(MockClientConfig {
            initial_snapshot: CallerSnapshot { public: json!({"todos": []}), private: json!({}), value: json!("Ready") },
            on_send: None,
        })
    }

    #[test]
    fn connect_and_disconnect_are_harmless_no_ops() {
        let client = client();
        client.connect();
        client.disconnect();
        assert_eq!(client.snapshot().value, json!("Ready"));
    }

    #[test]
    fn send_records_event_and_invokes_on_send_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let client = MockActorClient::new(MockClientConfig {
            initial_snapshot: CallerSnapshot { public: json!({}), private: json!({}), value: json!("Ready") },
            on_send: Some(Arc::new(move |event: &Value| seen_clone.lock().push(event.clone()))),
        });

        client.send(json!({"type": "ADD_TODO", "text": "buy milk"}));

        assert_eq!(client.sent_events(), vec![json!({"type": "ADD_TODO", "text": "buy milk"})]);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn produce_mutates_snapshot_and_notifies_subscribers() {
        let client = client();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);
        let _sub = client.subscribe(Arc::new(move |_: &CallerSnapshot<Value, Value, Value>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        client.produce(|snapshot| {
            snapshot.public["todos"].as_array_mut().unwrap().push(json!({"id": "1", "text": "a"}));
        });

        assert_eq!(client.snapshot().public["todos"].as_array().unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[yare::parameterized(
        already_satisfied = { "Ready", true },
        never_satisfied   = { "Done",  false },
    )]
    fn wait_for_matches_timeout_expectation(target: &str, expect_ok: bool) {
        let client = client();
        let result = client.wait_for(|s| s.value == json!(target), Duration::from_millis(30));
        assert_eq!(result.is_ok(), expect_ok);
    }

    #[test]
    fn wait_for_wakes_up_when_produce_runs_on_another_thread() {
        let client = Arc::new(client());
        let waiter = Arc::clone(&client);
        let handle = thread::spawn(move || waiter.wait_for(|s| s.value == json!("Done"), Duration::from_secs(1)));

        thread::sleep(Duration::from_millis(10));
        client.produce(|snapshot| snapshot.value = json!("Done"));

        let result = handle.join().unwrap();
        assert!(result.is_ok());
    }
}
