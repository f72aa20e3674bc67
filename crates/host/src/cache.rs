// SPDX-License-Identifier: MIT

//! `SnapshotCache`: `checksum -> {snapshot, timestamp}`, entries evicted
//! ~5 minutes after last reference (spec §3, §4.4 post-step step 2).

use std::collections::HashMap;
use std::time::Duration;

use ak_core::Clock;
use ak_patch::Checksum;
use serde_json::Value;

struct Entry {
    snapshot: Value,
    inserted_at: std::time::Instant,
}

/// Generic over the clock so tests can drive eviction with
/// [`ak_core::FakeClock`] instead of waiting on the real one.
pub struct SnapshotCache<C: Clock> {
    entries: HashMap<Checksum, Entry>,
    ttl: Duration,
    clock: C,
}

impl<C: Clock> SnapshotCache<C> {
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self { entries: HashMap::new(), ttl, clock }
    }

    /// Insert `(checksum -> snapshot)`, stamped with the current time.
    pub fn insert(&mut self, checksum: Checksum, snapshot: Value) {
        self.entries.insert(checksum, Entry { snapshot, inserted_at: self.clock.now() });
    }

    /// Evict entries older than the configured TTL. Called once per
    /// post-step routine; cheap enough not to need a background task.
    pub fn evict_expired(&mut self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);
    }

    pub fn get(&self, checksum: &Checksum) -> Option<&Value> {
        self.entries.get(checksum).map(|e| &e.snapshot)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
