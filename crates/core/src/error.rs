// SPDX-License-Identifier: MIT

//! Shared error kind, mirroring spec §7's error table. Each downstream
//! crate wraps this (or defines its own narrower enum) rather than
//! inventing parallel vocabulary — see SPEC_FULL.md §3.

use thiserror::Error;

/// The error kinds in spec §7 that are meaningful independent of any
/// one component. Crates that raise a more specific error (e.g.
/// ak-auth's `TokenError`) convert into this for cross-crate boundaries
/// that don't need the extra detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad event")]
    BadEvent,
    #[error("actor type not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("wait timed out")]
    WaitTimeout,
    #[error("patch application failed")]
    PatchFailed,
    #[error("resync required")]
    ResyncRequired,
    #[error("actor not ready")]
    NotReady,
    #[error("internal error: {0}")]
    Internal(String),
}
