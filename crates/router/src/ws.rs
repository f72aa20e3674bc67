// SPDX-License-Identifier: MIT

//! WebSocket upgrade and per-connection pump (spec §4.4 `connect`, §6
//! "WebSocket messages").
//!
//! Grounded in axum's built-in `ws` feature (already in the workspace
//! manifest) rather than the teacher's `tokio-tungstenite`-over-Docker
//! client plumbing (`oj-daemon::adapters::agent::docker::ws`) — that
//! code is the shape this module's `tokio::select!` pump follows, but
//! axum terminates the upgrade itself so there is no raw stream to wrap.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{debug, warn};

use ak_core::Clock;
use ak_host::CloseReason;
use ak_machine::Machine;
use ak_storage::SnapshotStore;

use crate::error::RouterError;
use crate::http::{build_event, parse_checksum, ApiQuery};
use crate::state::RouterState;
use crate::validate::EventValidator;

const RESYNC_REQUIRED_CODE: u16 = 4000;

pub async fn handle_upgrade<M, S, C, V>(
    State(state): State<RouterState<M, S, C, V>>,
    Path(actor_id): Path<String>,
    Query(query): Query<ApiQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, RouterError>
where
    M: Machine,
    M::Input: Default,
    S: SnapshotStore,
    C: Clock,
    V: EventValidator,
{
    let Some(token) = query.access_token.as_deref() else {
        return Err(RouterError::Unauthorized("missing `accessToken` query parameter".to_string()));
    };
    let address = ak_core::ActorAddress::new(state.registry.actor_type(), &actor_id);
    let caller = ak_auth::verify_access(&state.signing_key, token, &address)?;

    let handle = state.registry.get_or_spawn(&actor_id, caller.clone(), M::Input::default()).await?;
    let baseline = query.checksum.as_deref().map(parse_checksum);

    Ok(ws.on_upgrade(move |socket| run_connection(socket, handle, state.validator, caller, baseline)))
}

/// Pumps one connection: sends the initial resync, then forwards host
/// patches out and inbound client events in, until either side closes
/// (spec §4.4 "Subscription bookkeeping").
async fn run_connection<M, V>(
    mut socket: WebSocket,
    handle: ak_host::ActorHandle<M>,
    validator: std::sync::Arc<V>,
    caller: ak_core::Caller,
    baseline: Option<ak_patch::Checksum>,
) where
    M: Machine,
    V: EventValidator,
{
    let connected = match handle.connect(caller.clone(), baseline).await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "websocket connect rejected by actor host");
            let _ = socket.close().await;
            return;
        }
    };

    if let Some(patch) = connected.initial_patch {
        if send_patch(&mut socket, &patch).await.is_err() {
            handle.disconnect(connected.subscription_id);
            return;
        }
    }

    let mut patch_rx = connected.patch_receiver;
    let mut close_rx = connected.close_receiver;

    loop {
        tokio::select! {
            biased;

            reason = close_rx.recv() => {
                if let Some(reason) = reason {
                    close_with_reason(&mut socket, reason).await;
                }
                break;
            }
            patch = patch_rx.recv() => {
                match patch {
                    Some(patch) => {
                        if send_patch(&mut socket, &patch).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&handle, &validator, &caller, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "websocket read error, closing");
                        break;
                    }
                }
            }
        }
    }

    handle.disconnect(connected.subscription_id);
}

async fn send_patch(socket: &mut WebSocket, patch: &ak_host::Patch) -> Result<(), ()> {
    let text = serde_json::to_string(patch).map_err(|_| ())?;
    socket.send(Message::Text(text)).await.map_err(|_| ())
}

async fn close_with_reason(socket: &mut WebSocket, reason: CloseReason) {
    let (code, description) = match reason {
        CloseReason::ResyncRequired => (RESYNC_REQUIRED_CODE, "RESYNC_REQUIRED"),
    };
    let _ = socket.send(Message::Close(Some(CloseFrame { code, reason: description.into() }))).await;
}

/// A single inbound WebSocket frame is one client event (spec §6). The
/// caller is injected from the upgrade's verified token, never from
/// the frame body; a frame that fails validation is dropped silently
/// (spec §4.4(i) — `BAD_EVENT` has no socket-level reply defined).
async fn handle_inbound<M, V>(handle: &ak_host::ActorHandle<M>, validator: &std::sync::Arc<V>, caller: &ak_core::Caller, text: &str)
where
    M: Machine,
    V: EventValidator,
{
    let parsed: Result<Value, _> = serde_json::from_str(text);
    let Ok(Value::Object(map)) = parsed else {
        debug!("dropping non-object websocket frame");
        return;
    };
    match build_event(validator, map, caller.clone(), None) {
        Ok(event) => {
            if let Err(e) = handle.send(event).await {
                warn!(error = %e, "failed to enqueue websocket event");
            }
        }
        Err(e) => debug!(error = %e, "dropping websocket event that failed validation"),
    }
}
