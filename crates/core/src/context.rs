// SPDX-License-Identifier: MIT

//! Machine context, full snapshots, and per-caller projections.
//!
//! The privacy invariant lives here in spirit (see spec §3/§4.3): any
//! field under `public` is visible to every caller; fields keyed by
//! caller id under `private` are visible only to that caller. The
//! actual slicing (`project`) is done by ak-host, which owns the
//! checksum/diff machinery this type feeds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `{ public: P, private: map<callerId, Pr> }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineContext<P, Pr> {
    pub public: P,
    #[serde(default = "HashMap::new")]
    pub private: HashMap<String, Pr>,
}

impl<P, Pr> MachineContext<P, Pr> {
    pub fn new(public: P) -> Self {
        Self { public, private: HashMap::new() }
    }
}

/// Full machine state as the host persists and diffs it. Never shipped
/// to a client directly — only [`CallerSnapshot`] projections are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<P, Pr, V> {
    pub context: MachineContext<P, Pr>,
    pub value: V,
}

impl<P, Pr, V> Snapshot<P, Pr, V> {
    pub fn new(public: P, value: V) -> Self {
        Self { context: MachineContext::new(public), value }
    }
}

/// A single caller's slice of a [`Snapshot`]:
/// `{ public: P, private: private[caller] ?? default, value }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerSnapshot<P, Pr, V> {
    pub public: P,
    pub private: Pr,
    pub value: V,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_round_trips_private_map() {
        let mut ctx: MachineContext<serde_json::Value, serde_json::Value> =
            MachineContext::new(json!({"ownerId": "U1"}));
        ctx.private.insert("U1".to_string(), json!({"draft": "hi"}));
        let wire = serde_json::to_value(&ctx).unwrap();
        let back: MachineContext<serde_json::Value, serde_json::Value> = serde_json::from_value(wire).unwrap();
        assert_eq!(back.private.get("U1"), Some(&json!({"draft": "hi"})));
    }
}
