// SPDX-License-Identifier: MIT

//! Actor addresses: the `(actorType, actorId)` pair identifying a
//! singleton actor host across the process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Globally unique actor identity. The registry (ak-router/ak-host)
/// guarantees exactly one live host per address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorAddress {
    /// kebab-case actor type, e.g. `"todo"`.
    pub actor_type: String,
    pub actor_id: String,
}

impl ActorAddress {
    pub fn new(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self { actor_type: actor_type.into(), actor_id: actor_id.into() }
    }

    /// Whether `actor_type` looks kebab-case (lowercase ASCII alphanumerics and `-`).
    pub fn has_valid_type(&self) -> bool {
        !self.actor_type.is_empty()
            && self
                .actor_type
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl fmt::Display for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.actor_type, self.actor_id)
    }
}
