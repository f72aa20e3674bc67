// SPDX-License-Identifier: MIT

//! Caller identity: the subject attached to every event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The three kinds of event source the host recognizes.
///
/// System callers are synthesized by the host and must never be
/// accepted from the wire — see [`Caller::is_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerType {
    Client,
    Service,
    System,
}

impl fmt::Display for CallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallerType::Client => "client",
            CallerType::Service => "service",
            CallerType::System => "system",
        };
        f.write_str(s)
    }
}

/// Identified source of an event: `{ type, id }`.
///
/// Serializes over the wire as `"<type>-<id>"` (see [`Caller::to_sub`]),
/// with `id` a UUID or the literal `"anonymous"` for an unauthenticated
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    #[serde(rename = "type")]
    pub caller_type: CallerType,
    pub id: String,
}

const ANONYMOUS: &str = "anonymous";

impl Caller {
    pub fn client(id: impl Into<String>) -> Self {
        Self { caller_type: CallerType::Client, id: id.into() }
    }

    pub fn anonymous_client() -> Self {
        Self { caller_type: CallerType::Client, id: ANONYMOUS.to_string() }
    }

    pub fn service(id: impl Into<String>) -> Self {
        Self { caller_type: CallerType::Service, id: id.into() }
    }

    /// Construct a system caller. Only the host may do this — system
    /// callers are never parsed from a token or request body.
    pub fn system(id: impl Into<String>) -> Self {
        Self { caller_type: CallerType::System, id: id.into() }
    }

    pub fn is_system(&self) -> bool {
        self.caller_type == CallerType::System
    }

    /// The `sub` claim format used by [`crate::Caller`]'s token binding:
    /// `<callerType>-<callerId>`.
    pub fn to_sub(&self) -> String {
        format!("{}-{}", self.caller_type, self.id)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sub())
    }
}

/// Failure parsing a `sub` claim back into a [`Caller`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCallerError {
    #[error("subject has no `-` separator: {0:?}")]
    MissingSeparator(String),
    #[error("unknown caller type {0:?}")]
    UnknownType(String),
    #[error("caller id is neither a uuid nor \"anonymous\": {0:?}")]
    InvalidId(String),
}

impl FromStr for Caller {
    type Err = ParseCallerError;

    /// Parses `<callerType>-<uuid|"anonymous">`.
    ///
    /// The id portion may itself contain `-` (UUIDs do), so we split on
    /// the first separator only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, id) = s.split_once('-').ok_or_else(|| ParseCallerError::MissingSeparator(s.to_string()))?;
        let caller_type = match ty {
            "client" => CallerType::Client,
            "service" => CallerType::Service,
            "system" => CallerType::System,
            other => return Err(ParseCallerError::UnknownType(other.to_string())),
        };
        if id != ANONYMOUS && Uuid::parse_str(id).is_err() {
            return Err(ParseCallerError::InvalidId(id.to_string()));
        }
        Ok(Caller { caller_type, id: id.to_string() })
    }
}

#[cfg(test)]
#[path = "caller_tests.rs"]
mod tests;
