// SPDX-License-Identifier: MIT

//! C3 — per-caller projection (spec §4.3).
//!
//! `project` is the only place the privacy invariant is enforced: a
//! caller's slice of a snapshot is exactly its public context plus
//! whatever `private[callerId]` it owns, nothing else.

use ak_core::{CallerSnapshot, Snapshot};

/// `project(snapshot, callerId) -> { public, private: private[callerId] ?? default, value }`.
pub fn project<P, Pr, V>(snapshot: &Snapshot<P, Pr, V>, caller_id: &str) -> CallerSnapshot<P, Pr, V>
where
    P: Clone,
    Pr: Clone + Default,
    V: Clone,
{
    let private = snapshot.context.private.get(caller_id).cloned().unwrap_or_default();
    CallerSnapshot { public: snapshot.context.public.clone(), private, value: snapshot.value.clone() }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
