use super::*;
use ak_core::FakeClock;
use serde_json::json;
use std::time::Duration;

#[test]
fn get_returns_inserted_snapshot() {
    let mut cache = SnapshotCache::new(Duration::from_secs(300), FakeClock::new());
    let checksum: Checksum = "abc".to_string().into();
    cache.insert(checksum.clone(), json!({"a": 1}));
    assert_eq!(cache.get(&checksum), Some(&json!({"a": 1})));
}

#[test]
fn unknown_checksum_misses() {
    let cache = SnapshotCache::new(Duration::from_secs(300), FakeClock::new());
    let checksum: Checksum = "missing".to_string().into();
    assert_eq!(cache.get(&checksum), None);
}

#[test]
fn entries_older_than_ttl_are_evicted() {
    let clock = FakeClock::new();
    let mut cache = SnapshotCache::new(Duration::from_secs(300), clock.clone());
    let checksum: Checksum = "abc".to_string().into();
    cache.insert(checksum.clone(), json!({"a": 1}));

    clock.advance(Duration::from_secs(301));
    cache.evict_expired();

    assert_eq!(cache.len(), 0);
    assert_eq!(cache.get(&checksum), None);
}

#[test]
fn entries_within_ttl_survive_eviction_sweep() {
    let clock = FakeClock::new();
    let mut cache = SnapshotCache::new(Duration::from_secs(300), clock.clone());
    let checksum: Checksum = "abc".to_string().into();
    cache.insert(checksum.clone(), json!({"a": 1}));

    clock.advance(Duration::from_secs(100));
    cache.evict_expired();

    assert_eq!(cache.len(), 1);
}
