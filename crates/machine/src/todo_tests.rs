use super::*;
use crate::Machine as _;
use ak_core::RequestInfo;
use serde_json::json;

fn add_todo_event(caller: Caller, text: &str) -> Event {
    let mut payload = serde_json::Map::new();
    payload.insert("text".to_string(), json!(text));
    Event { event_type: "ADD_TODO".to_string(), payload, caller, request_info: None::<RequestInfo> }
}

#[test]
fn owner_can_add_todo() {
    let owner = Caller::client("U1");
    let mut machine = TodoMachine::start(owner.clone(), TodoInput::default());

    machine.send(&add_todo_event(owner, "a")).unwrap();

    let snapshot = machine.get_snapshot();
    assert_eq!(snapshot.context.public.todos.len(), 1);
    assert_eq!(snapshot.context.public.todos[0].text, "a");
    assert!(!snapshot.context.public.todos[0].completed);
}

#[test]
fn non_owner_add_todo_is_rejected_without_mutation() {
    let owner = Caller::client("U1");
    let intruder = Caller::client("U2");
    let mut machine = TodoMachine::start(owner, TodoInput::default());

    let before = machine.get_snapshot().context.public.todos.clone();
    let err = machine.send(&add_todo_event(intruder, "a")).unwrap_err();

    assert_eq!(err.event_type, "ADD_TODO");
    assert_eq!(machine.get_snapshot().context.public.todos, before);
}

#[test]
fn owner_can_complete_existing_todo() {
    let owner = Caller::client("U1");
    let mut machine = TodoMachine::start(owner.clone(), TodoInput::default());
    machine.send(&add_todo_event(owner.clone(), "a")).unwrap();
    let id = machine.get_snapshot().context.public.todos[0].id.clone();

    let mut payload = serde_json::Map::new();
    payload.insert("id".to_string(), json!(id));
    let event = Event { event_type: "COMPLETE_TODO".to_string(), payload, caller: owner, request_info: None };
    machine.send(&event).unwrap();

    assert!(machine.get_snapshot().context.public.todos[0].completed);
}

#[test]
fn completing_unknown_todo_is_rejected() {
    let owner = Caller::client("U1");
    let mut machine = TodoMachine::start(owner.clone(), TodoInput::default());

    let mut payload = serde_json::Map::new();
    payload.insert("id".to_string(), json!("does-not-exist"));
    let event = Event { event_type: "COMPLETE_TODO".to_string(), payload, caller: owner, request_info: None };

    assert!(machine.send(&event).is_err());
}

#[test]
fn draft_is_private_per_caller() {
    let owner = Caller::client("U1");
    let other = Caller::client("U2");
    let mut machine = TodoMachine::start(owner.clone(), TodoInput::default());

    let mut payload = serde_json::Map::new();
    payload.insert("draft".to_string(), json!("scratch"));
    machine.send(&Event { event_type: "SET_DRAFT".to_string(), payload, caller: owner.clone(), request_info: None }).unwrap();

    let snapshot = machine.get_snapshot();
    assert_eq!(snapshot.context.private.get(&owner.id).and_then(|p| p.draft.clone()), Some("scratch".to_string()));
    assert!(snapshot.context.private.get(&other.id).is_none());
}

#[test]
fn unknown_event_type_is_rejected() {
    let owner = Caller::client("U1");
    let mut machine = TodoMachine::start(owner.clone(), TodoInput::default());
    let event = Event { event_type: "NOT_A_REAL_EVENT".to_string(), payload: serde_json::Map::new(), caller: owner, request_info: None };
    assert!(machine.send(&event).is_err());
}

#[test]
fn restore_reconstructs_state_from_snapshot() {
    let owner = Caller::client("U1");
    let mut machine = TodoMachine::start(owner.clone(), TodoInput::default());
    machine.send(&add_todo_event(owner.clone(), "a")).unwrap();
    let snapshot = machine.get_snapshot();

    let restored = TodoMachine::restore(snapshot.clone(), owner, TodoInput::default());
    assert_eq!(restored.get_snapshot().context.public.todos, snapshot.context.public.todos);
}
