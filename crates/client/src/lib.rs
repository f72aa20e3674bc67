// SPDX-License-Identifier: MIT

//! ak-client: C7, the long-lived WebSocket client runtime (spec §4.7).
//!
//! Grounded in the teacher's `oj-daemon::adapters::agent::docker::ws`
//! event bridge — the same `tokio::select!`-over-socket-plus-shutdown
//! pump, generalized from "bridge container events onto an mpsc
//! channel" to "reconcile a local projected snapshot from a patch
//! stream and notify subscribers", using `tokio-tungstenite` as the
//! teacher does for its own outbound WebSocket connections.

mod client;
mod error;

pub use client::{ActorClient, ClientConfig, ErrorListener, StateListener, Subscription};
pub use error::ClientError;

use url::Url;

/// Whether `host` (with or without a `:port` suffix) is a loopback
/// address, per spec §4.6/§4.7's shared `http`/`ws` vs `https`/`wss`
/// rule. Mirrors `ak_router::fetch::is_loopback_host` independently —
/// the two crates intentionally do not share a dependency for this one
/// three-line rule.
pub fn is_loopback_host(host: &str) -> bool {
    let hostname = host.split(':').next().unwrap_or(host);
    matches!(hostname, "localhost" | "127.0.0.1" | "0.0.0.0")
}

/// Builds the `ws://`/`wss://` URL for an actor's WebSocket endpoint
/// (spec §4.7).
pub(crate) fn build_ws_url(
    host: &str,
    actor_type: &str,
    actor_id: &str,
    access_token: &str,
    checksum: Option<&str>,
) -> Result<Url, url::ParseError> {
    let scheme = if is_loopback_host(host) { "ws" } else { "wss" };
    let mut url = Url::parse(&format!("{scheme}://{host}/api/{actor_type}/{actor_id}"))?;
    {
        let mut qp = url.query_pairs_mut();
        qp.append_pair("accessToken", access_token);
        if let Some(checksum) = checksum {
            qp.append_pair("checksum", checksum);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_host_uses_ws() {
        let url = build_ws_url("localhost:8080", "todo", "L1", "tok", None).unwrap();
        assert_eq!(url.scheme(), "ws");
        assert!(url.as_str().starts_with("ws://localhost:8080/api/todo/L1?"));
    }

    #[test]
    fn remote_host_uses_wss_and_carries_checksum() {
        let url = build_ws_url("actors.example.com", "todo", "L1", "tok", Some("abc123")).unwrap();
        assert_eq!(url.scheme(), "wss");
        assert!(url.query().unwrap().contains("checksum=abc123"));
    }
}
