// SPDX-License-Identifier: MIT

//! Event envelope.
//!
//! `type` plus an arbitrary payload is exactly what reaches the wire;
//! validating that payload against a client or service schema is the
//! schema library's job (a collaborator out of scope for this crate —
//! see spec §1). What this crate owns is the envelope shape and the
//! fixed set of system events the host itself synthesizes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::caller::Caller;

/// Request metadata a router may attach (e.g. the connection's remote
/// address), forwarded to the machine for informational purposes only
/// — it never affects authorization, which is decided before the event
/// reaches the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// The fixed system events the host may synthesize. Never accepted
/// from the wire — `Caller` on these is always `Caller::system(..)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemEventKind {
    #[serde(rename = "INITIALIZE")]
    Initialize,
    #[serde(rename = "RESUME")]
    Resume,
    #[serde(rename = "CONNECT")]
    Connect { connecting_caller: Caller },
    #[serde(rename = "DISCONNECT")]
    Disconnect { disconnecting_caller: Caller },
    #[serde(rename = "MIGRATE")]
    Migrate { operations: Vec<Value> },
}

/// A single event bound for an actor.
///
/// `caller` is authoritative and must be attached by the host — a
/// client-submitted body never carries its own `caller` field; the
/// router/host overwrite or reject it (see [`Event::from_wire`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub caller: Caller,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_info: Option<RequestInfo>,
}

impl Event {
    /// Build a system event with the given synthesized caller.
    pub fn system(kind: SystemEventKind, caller: Caller) -> Self {
        debug_assert!(caller.is_system());
        let encoded = serde_json::to_value(&kind).unwrap_or(Value::Null);
        let mut payload = match encoded {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let event_type = payload
            .remove("type")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Event { event_type, payload, caller, request_info: None }
    }

    /// Parses a wire-submitted body (no `caller` field allowed) into an
    /// `Event`, stamping the host-authoritative `caller`.
    ///
    /// Returns `None` if the body already claims a `caller` field —
    /// callers must never be accepted from client input.
    pub fn from_wire(mut body: Map<String, Value>, caller: Caller, request_info: Option<RequestInfo>) -> Option<Self> {
        if body.remove("caller").is_some() {
            return None;
        }
        let event_type = body.remove("type")?.as_str()?.to_string();
        Some(Event { event_type, payload: body, caller, request_info })
    }

    pub fn is_system(&self) -> bool {
        self.caller.is_system()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
