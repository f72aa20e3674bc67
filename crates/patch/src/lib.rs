// SPDX-License-Identifier: MIT

//! ak-patch: JSON-patch (RFC 6902) diff/apply and snapshot checksums.
//!
//! Grounded in the `json-patch` crate (already in the retrieval pack's
//! `estuary-flow` manifest) for the RFC 6902 mechanics; checksum is a
//! thin `sha2` wrapper the host uses purely as a cache key and "are we
//! the same" hint (spec §4.2 — collisions are tolerated by design).

mod checksum;

pub use checksum::Checksum;
pub use json_patch::PatchOperation;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to apply patch: {0}")]
    ApplyFailed(String),
    #[error("failed to serialize snapshot: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// Canonical diff between two JSON documents.
///
/// Ordering is whatever `json_patch::diff` produces over `serde_json`'s
/// default `Value::Object` (a `BTreeMap`-backed, key-sorted map), which
/// makes the result path-sorted and stable for equal inputs: equal
/// `prev`/`next` always yield an empty op list. This crate and every
/// downstream crate must avoid serde_json's `preserve_order` feature,
/// or that guarantee breaks.
pub fn diff(prev: &Value, next: &Value) -> Vec<PatchOperation> {
    json_patch::diff(prev, next).0
}

/// Applies `ops` to a clone of `doc`. On failure (the client's baseline
/// no longer matches what these ops assume) returns `PatchError`; the
/// caller must resync from the server's current checksum rather than
/// retry the same patch.
pub fn apply(doc: &Value, ops: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut out = doc.clone();
    let patch = json_patch::Patch(ops.to_vec());
    json_patch::patch(&mut out, &patch).map_err(|e| PatchError::ApplyFailed(e.to_string()))?;
    Ok(out)
}

/// Computes a deterministic checksum of any serializable snapshot.
pub fn checksum_of<T: Serialize>(value: &T) -> Result<Checksum, PatchError> {
    let bytes = serde_json::to_vec(value)?;
    Ok(Checksum::from_canonical_bytes(&bytes))
}
