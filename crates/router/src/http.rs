// SPDX-License-Identifier: MIT

//! GET/POST/WebSocket-upgrade handlers for `/api/<actorType>/<actorId>`
//! (spec §4.5, §6). All three share one path — the router is nested
//! under `/api/<actorType>` (see [`crate::router`]), so an unknown
//! actor type never reaches a handler here at all and falls through to
//! axum's own 404.

use std::sync::Arc;
use std::time::Duration;

use ak_core::{Caller, Clock, Event};
use ak_host::WaitFor;
use ak_machine::Machine;
use ak_patch::Checksum;
use ak_storage::SnapshotStore;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RouterError;
use crate::state::RouterState;
use crate::validate::EventValidator;
use crate::ws;

/// Query parameters across all three methods sharing this path: GET's
/// wait-for form (spec §4.5), the WebSocket upgrade's `accessToken`/
/// `checksum` (spec §6 — browsers cannot set headers on a WS upgrade),
/// and the fetch protocol's `input` (spec §4.6, consumed only on the
/// lazy first-contact spawn).
#[derive(Debug, Deserialize, Default)]
pub struct ApiQuery {
    #[serde(rename = "waitForEvent")]
    pub wait_for_event: Option<String>,
    #[serde(rename = "waitForState")]
    pub wait_for_state: Option<String>,
    pub timeout: Option<u64>,
    #[serde(rename = "errorOnWaitTimeout", default)]
    pub error_on_wait_timeout: bool,
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    pub checksum: Option<String>,
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetSnapshotBody<P, Pr, V> {
    pub snapshot: SnapshotBody<P, Pr, V>,
    pub checksum: String,
}

#[derive(Debug, Serialize)]
pub struct SnapshotBody<P, Pr, V> {
    pub public: P,
    pub private: Pr,
    pub value: V,
}

#[derive(Debug, Serialize)]
pub struct PostEventBody {
    pub ok: bool,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, RouterError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| RouterError::Unauthorized("missing or malformed Authorization header".to_string()))
}

fn authorize<M: Machine, S: SnapshotStore, C: Clock, V: EventValidator>(
    state: &RouterState<M, S, C, V>,
    headers: &HeaderMap,
    actor_id: &str,
) -> Result<Caller, RouterError> {
    let token = bearer_token(headers)?;
    let address = ak_core::ActorAddress::new(state.registry.actor_type(), actor_id);
    let caller = ak_auth::verify_access(&state.signing_key, token, &address)?;
    Ok(caller)
}

/// Parses the `input` query param (a JSON-encoded [`Machine::Input`])
/// used on first contact (spec §4.5 "callers desiring initial input
/// must provide it ... through a framework-specific path" — this is
/// that path). Falls back to `M::Input::default()` when absent.
fn resolve_input<M: Machine>(raw: &Option<String>) -> Result<M::Input, RouterError>
where
    M::Input: Default,
{
    match raw {
        None => Ok(M::Input::default()),
        Some(s) => serde_json::from_str(s).map_err(|e| RouterError::Internal(format!("invalid `input` query parameter: {e}"))),
    }
}

/// Single entry point for the shared GET path: a plain GET returns the
/// current snapshot, a GET carrying `Upgrade: websocket` is handed to
/// [`ws::handle_upgrade`] instead (spec §4.5).
pub async fn get_or_upgrade<M, S, C, V>(
    state: State<RouterState<M, S, C, V>>,
    path: Path<String>,
    query: Query<ApiQuery>,
    headers: HeaderMap,
    ws_upgrade: Option<WebSocketUpgrade>,
) -> Result<Response, RouterError>
where
    M: Machine,
    M::Input: Default,
    S: SnapshotStore,
    C: Clock,
    V: EventValidator,
{
    match ws_upgrade {
        Some(upgrade) => ws::handle_upgrade(state, path, query, upgrade).await,
        None => get_snapshot(state, path, query, headers).await.map(|json| json.into_response()),
    }
}

async fn get_snapshot<M, S, C, V>(
    State(state): State<RouterState<M, S, C, V>>,
    Path(actor_id): Path<String>,
    Query(query): Query<ApiQuery>,
    headers: HeaderMap,
) -> Result<Json<GetSnapshotBody<M::Public, M::Private, M::Value>>, RouterError>
where
    M: Machine,
    M::Input: Default,
    S: SnapshotStore,
    C: Clock,
    V: EventValidator,
{
    let caller = authorize(&state, &headers, &actor_id)?;
    let input = resolve_input::<M>(&query.input)?;
    let handle = state.registry.get_or_spawn(&actor_id, caller.clone(), input).await?;

    let wait = build_wait(&query);
    let result = handle.get_snapshot(caller.id, wait).await.map_err(RouterError::from)?;

    Ok(Json(GetSnapshotBody {
        snapshot: SnapshotBody { public: result.snapshot.public, private: result.snapshot.private, value: result.snapshot.value },
        checksum: result.checksum.to_string(),
    }))
}

fn build_wait(query: &ApiQuery) -> Option<WaitFor> {
    if query.wait_for_event.is_none() && query.wait_for_state.is_none() {
        return None;
    }
    Some(WaitFor {
        event_type: query.wait_for_event.clone(),
        state: query.wait_for_state.as_ref().map(|s| Value::String(s.clone())),
        timeout: Duration::from_millis(query.timeout.unwrap_or(5_000)),
        error_on_timeout: query.error_on_wait_timeout,
    })
}

pub async fn post_event<M, S, C, V>(
    State(state): State<RouterState<M, S, C, V>>,
    Path(actor_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<PostEventBody>, RouterError>
where
    M: Machine,
    M::Input: Default,
    S: SnapshotStore,
    C: Clock,
    V: EventValidator,
{
    let caller = authorize(&state, &headers, &actor_id)?;

    let Value::Object(map) = body else {
        return Err(RouterError::BadEvent("request body must be a JSON object".to_string()));
    };

    let event = build_event(&state.validator, map, caller.clone(), None)?;
    let handle = state.registry.get_or_spawn(&actor_id, caller, M::Input::default()).await?;
    handle.send(event).await.map_err(RouterError::from)?;

    Ok(Json(PostEventBody { ok: true }))
}

/// Shared by HTTP POST and the WebSocket inbound path: strips any
/// client-supplied `caller`, stamps the host-authoritative one, and
/// runs it past the validator (spec §3 "caller is authoritative").
pub(crate) fn build_event<V: EventValidator>(
    validator: &Arc<V>,
    body: Map<String, Value>,
    caller: Caller,
    request_info: Option<ak_core::RequestInfo>,
) -> Result<Event, RouterError> {
    let Some(event) = Event::from_wire(body, caller.clone(), request_info) else {
        return Err(RouterError::BadEvent("request body must not include a `caller` field".to_string()));
    };

    let validation = if caller.caller_type == ak_core::CallerType::Service {
        validator.validate_service(&event.event_type, &event.payload)
    } else {
        validator.validate_client(&event.event_type, &event.payload)
    };
    validation.map_err(RouterError::BadEvent)?;

    Ok(event)
}

/// Re-exported so [`crate::fetch`] can parse a `checksum` string back
/// into the opaque type without depending on `ak-patch` directly.
pub fn parse_checksum(raw: &str) -> Checksum {
    Checksum::from(raw.to_string())
}
