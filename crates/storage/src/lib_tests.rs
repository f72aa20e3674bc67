use super::*;
use serde_json::json;

#[test]
fn persisted_snapshot_round_trips_through_json() {
    let snapshot = PersistedSnapshot { version: 3, state: json!({"owner": "U1"}), created_at: Utc::now() };
    let wire = serde_json::to_value(&snapshot).unwrap();
    let back: PersistedSnapshot = serde_json::from_value(wire).unwrap();
    assert_eq!(back.version, 3);
    assert_eq!(back.state, json!({"owner": "U1"}));
}

#[test]
fn version_defaults_to_zero_when_absent() {
    let back: PersistedSnapshot = serde_json::from_value(json!({
        "state": {"a": 1},
        "created_at": Utc::now(),
    }))
    .unwrap();
    assert_eq!(back.version, 0);
}
