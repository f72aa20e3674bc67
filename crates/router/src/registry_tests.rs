use std::sync::Arc;
use std::time::Duration;

use ak_core::{Caller, SystemClock};
use ak_machine::todo::{TodoInput, TodoMachine};
use ak_storage::MemorySnapshotStore;

use super::*;

fn registry() -> Registry<TodoMachine, MemorySnapshotStore, SystemClock> {
    Registry::new("todo", Arc::new(MemorySnapshotStore::new()), SystemClock, Duration::from_secs(300), Duration::ZERO)
}

#[tokio::test]
async fn first_contact_spawns_exactly_one_host_per_address() {
    let reg = registry();
    let caller = Caller::client("11111111-1111-1111-1111-111111111111");

    reg.get_or_spawn("L1", caller.clone(), TodoInput::default()).await.unwrap();
    reg.get_or_spawn("L1", caller.clone(), TodoInput::default()).await.unwrap();
    reg.get_or_spawn("L2", caller, TodoInput::default()).await.unwrap();

    assert_eq!(reg.spawned_count(), 2);
}

#[tokio::test]
async fn unspawned_address_has_no_handle() {
    let reg = registry();
    assert!(reg.get("never-touched").is_none());
}
