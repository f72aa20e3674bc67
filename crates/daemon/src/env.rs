// SPDX-License-Identifier: MIT

//! Environment-variable configuration, one function per setting
//! (SPEC_FULL.md §3 "ambient stack"). Grounded in the teacher's
//! `oj-daemon::env` — a `std::env::var` read with a typed fallback
//! default per function, no config file, no builder.
//!
//! `ACTOR_KIT_HOST` is resolved to a single explicit value (DESIGN.md
//! "Open Question: ACTOR_KIT_HOST"): there is no separate
//! internal/external split, so the same value both binds the listener
//! and is advertised to other actors for C6 fetches.

use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1:8080";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 0;

/// The HMAC signing key for access/connection tokens (spec §4.1). There
/// is no default: a daemon started without one refuses to boot rather
/// than mint tokens nobody else can verify.
pub fn signing_key() -> Result<Vec<u8>, EnvError> {
    std::env::var("ACTOR_KIT_SECRET").map(String::into_bytes).map_err(|_| EnvError::MissingSecret)
}

/// `host:port` this process binds to and advertises to other actors
/// for C6 fetches (spec §4.6).
pub fn host() -> String {
    std::env::var("ACTOR_KIT_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string())
}

/// Directory snapshots and actor metadata are written under (spec §5).
pub fn state_dir() -> std::path::PathBuf {
    match std::env::var("ACTOR_KIT_STATE_DIR") {
        Ok(dir) => std::path::PathBuf::from(dir),
        Err(_) => dirs::state_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("actor-kit"),
    }
}

/// How long a cached public-projection checksum stays valid for resync
/// (spec §4.4 "resolve_initial_resync").
pub fn cache_ttl() -> Duration {
    let secs = std::env::var("ACTOR_KIT_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECS);
    Duration::from_secs(secs)
}

/// Minimum spacing between persistence writes for one actor (spec §9
/// "Open Question: persistence coalescing"). `0` (the default)
/// persists on every step, matching spec.md's literal read.
pub fn persist_debounce() -> Duration {
    let ms = std::env::var("ACTOR_KIT_PERSIST_DEBOUNCE_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PERSIST_DEBOUNCE_MS);
    Duration::from_millis(ms)
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("ACTOR_KIT_SECRET is not set")]
    MissingSecret,
}
