// SPDX-License-Identifier: MIT

//! C6 — server-side fetch protocol: an authenticated HTTP round trip
//! to the router from another backend process, mirroring exactly what
//! a browser's GET does but minting its own token (spec §4.6).
//!
//! Grounded in `reqwest`, already in the pack's workspace (SpacetimeDB's
//! `client-api` and estuary-flow both use it for backend-to-backend
//! calls); the loopback/HTTPS proto rule matches `ak-client`'s
//! (C7) identical rule for its `ws`/`wss` choice.

use std::time::Duration;

use ak_core::{ActorAddress, Caller};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::http::{GetSnapshotBody, SnapshotBody};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("wait timed out")]
    WaitTimeout,
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("router returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Optional query parameters this helper forwards (spec §4.6 URL
/// shape). `input` is only meaningful on the lazy first-contact spawn.
#[derive(Debug, Default, Clone)]
pub struct FetchOptions {
    pub input: Option<Value>,
    pub wait_for_event: Option<String>,
    pub wait_for_state: Option<Value>,
    pub timeout: Option<Duration>,
    pub error_on_wait_timeout: bool,
}

/// `<proto>://` selection: loopback hosts get `http`, everything else
/// `https` (spec §4.6). Shared in spirit with [`crate::ws::handle_upgrade`]'s
/// browser-side counterpart in `ak-client`.
pub fn is_loopback_host(host: &str) -> bool {
    let hostname = host.split(':').next().unwrap_or(host);
    matches!(hostname, "localhost" | "127.0.0.1" | "0.0.0.0")
}

fn build_url(host: &str, address: &ActorAddress, opts: &FetchOptions) -> String {
    let proto = if is_loopback_host(host) { "http" } else { "https" };
    let mut url = format!("{proto}://{host}/api/{}/{}", address.actor_type, address.actor_id);
    let mut params = Vec::new();
    if let Some(input) = &opts.input {
        params.push(format!("input={}", urlencode(&input.to_string())));
    }
    if let Some(event) = &opts.wait_for_event {
        params.push(format!("waitForEvent={}", urlencode(event)));
    }
    if let Some(state) = &opts.wait_for_state {
        let raw = state.as_str().map(str::to_string).unwrap_or_else(|| state.to_string());
        params.push(format!("waitForState={}", urlencode(&raw)));
    }
    if let Some(timeout) = opts.timeout {
        params.push(format!("timeout={}", timeout.as_millis()));
    }
    if opts.error_on_wait_timeout {
        params.push("errorOnWaitTimeout=true".to_string());
    }
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}

fn urlencode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Performs the authenticated fetch and deserializes the router's
/// `{snapshot, checksum}` body. A `408` is translated to
/// [`FetchError::WaitTimeout`] unless `opts.error_on_wait_timeout` is
/// `false`, in which case the router would not have sent one in the
/// first place (the timeout branch only fires when that flag is set).
pub async fn fetch_snapshot<P, Pr, V>(
    client: &reqwest::Client,
    host: &str,
    signing_key: &[u8],
    address: &ActorAddress,
    caller: &Caller,
    opts: &FetchOptions,
) -> Result<GetSnapshotBody<P, Pr, V>, FetchError>
where
    P: DeserializeOwned,
    Pr: DeserializeOwned,
    V: DeserializeOwned,
{
    let token = ak_auth::issue_access(signing_key, address, caller);
    let url = build_url(host, address, opts);

    let response = client.get(&url).bearer_auth(token).send().await?;
    let status = response.status();

    if status.as_u16() == 408 {
        return Err(FetchError::WaitTimeout);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status { status: status.as_u16(), body });
    }

    let body: RawBody<P, Pr, V> = response.json().await?;
    Ok(GetSnapshotBody { snapshot: SnapshotBody { public: body.snapshot.public, private: body.snapshot.private, value: body.snapshot.value }, checksum: body.checksum })
}

#[derive(Debug, serde::Deserialize)]
struct RawBody<P, Pr, V> {
    snapshot: RawSnapshot<P, Pr, V>,
    checksum: String,
}

#[derive(Debug, serde::Deserialize)]
struct RawSnapshot<P, Pr, V> {
    public: P,
    private: Pr,
    value: V,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_hosts_use_http() {
        assert!(is_loopback_host("localhost:8080"));
        assert!(is_loopback_host("127.0.0.1:8080"));
        assert!(is_loopback_host("0.0.0.0:8080"));
        assert!(!is_loopback_host("example.com"));
    }

    #[test]
    fn build_url_includes_wait_params() {
        let address = ActorAddress::new("todo", "L1");
        let opts = FetchOptions { wait_for_state: Some(Value::String("Ready".to_string())), error_on_wait_timeout: true, ..Default::default() };
        let url = build_url("localhost:8080", &address, &opts);
        assert!(url.starts_with("http://localhost:8080/api/todo/L1?"));
        assert!(url.contains("waitForState=Ready"));
        assert!(url.contains("errorOnWaitTimeout=true"));
    }
}
