// SPDX-License-Identifier: MIT

//! The schema-validation library is a collaborator the core only
//! consumes through an interface (spec §1 "out of scope"): this crate
//! validates the envelope (`type` field present, `caller` absent from
//! the wire body — see [`ak_core::Event::from_wire`]) and otherwise
//! defers payload-shape checking to whatever [`EventValidator`] the
//! binary wires in.

use serde_json::{Map, Value};

/// Validates a client or service event payload against whatever schema
/// a concrete deployment uses. The reference implementation in
/// `ak-daemon` accepts anything with a recognized `type`; a real
/// deployment would plug in a JSON-schema or `serde`-derived validator
/// here instead.
pub trait EventValidator: Send + Sync + 'static {
    /// Returns `Err(reason)` if `event_type`/`payload` is not a
    /// well-formed client event.
    fn validate_client(&self, event_type: &str, payload: &Map<String, Value>) -> Result<(), String>;

    /// Returns `Err(reason)` if `event_type`/`payload` is not a
    /// well-formed service event.
    fn validate_service(&self, event_type: &str, payload: &Map<String, Value>) -> Result<(), String> {
        self.validate_client(event_type, payload)
    }
}

/// Accepts any event whose `type` is non-empty. Used by the demo
/// binary and by this crate's own tests; production deployments should
/// supply a real [`EventValidator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveValidator;

impl EventValidator for PermissiveValidator {
    fn validate_client(&self, event_type: &str, _payload: &Map<String, Value>) -> Result<(), String> {
        if event_type.is_empty() {
            return Err("event type must be non-empty".to_string());
        }
        Ok(())
    }
}
