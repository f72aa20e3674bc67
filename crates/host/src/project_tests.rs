use super::*;
use ak_core::MachineContext;
use proptest::collection::hash_map;
use proptest::prelude::*;
use serde_json::{json, Value};

type JsonSnapshot = Snapshot<Value, Value, Value>;

fn snapshot(public: Value, private: std::collections::HashMap<String, Value>) -> JsonSnapshot {
    Snapshot { context: MachineContext { public, private }, value: json!("ready") }
}

#[test]
fn private_defaults_when_caller_has_no_entry() {
    let s = snapshot(json!({"ownerId": "U1"}), std::collections::HashMap::new());
    let projected = project(&s, "U1");
    assert_eq!(projected.private, Value::Null);
}

#[test]
fn private_is_caller_scoped() {
    let mut private = std::collections::HashMap::new();
    private.insert("U1".to_string(), json!({"draft": "a"}));
    private.insert("U2".to_string(), json!({"draft": "b"}));
    let s = snapshot(json!({}), private);

    assert_eq!(project(&s, "U1").private, json!({"draft": "a"}));
    assert_eq!(project(&s, "U2").private, json!({"draft": "b"}));
}

#[test]
fn public_is_identical_across_callers() {
    let mut private = std::collections::HashMap::new();
    private.insert("U1".to_string(), json!({"draft": "a"}));
    let s = snapshot(json!({"ownerId": "U1"}), private);

    assert_eq!(project(&s, "U1").public, project(&s, "U2").public);
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), any::<i64>().prop_map(|n| json!(n)), ".*".prop_map(|s: String| json!(s)),]
}

proptest! {
    /// Projection privacy (spec §8): a change confined to `private[b]`
    /// never alters what caller `a` observes.
    #[test]
    fn changing_one_callers_private_does_not_affect_another(
        private in hash_map("[a-c]", arb_value(), 0..4),
        new_value_for_b in arb_value(),
    ) {
        let s1 = snapshot(json!({"shared": true}), private.clone());
        let mut private2 = private;
        private2.insert("b".to_string(), new_value_for_b);
        let s2 = snapshot(json!({"shared": true}), private2);

        prop_assert_eq!(project(&s1, "a"), project(&s2, "a"));
    }
}
