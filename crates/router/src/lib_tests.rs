//! Black-box tests against the built axum `Router`, using
//! `tower::ServiceExt::oneshot` instead of binding a real socket —
//! matching the teacher workspace's `oj-specs` black-box style
//! (SPEC_FULL.md §3 "Test tooling"), adapted from whole-binary to
//! whole-router scope since there is no separate CLI to drive here.

use std::sync::Arc;
use std::time::Duration;

use ak_core::{ActorAddress, Caller};
use ak_machine::todo::{TodoInput, TodoMachine};
use ak_storage::MemorySnapshotStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::registry::Registry;
use crate::state::RouterState;
use crate::validate::PermissiveValidator;

const SECRET: &[u8] = b"test-signing-key";

fn app() -> axum::Router {
    let registry = Registry::<TodoMachine, MemorySnapshotStore, ak_core::SystemClock>::new(
        "todo",
        Arc::new(MemorySnapshotStore::new()),
        ak_core::SystemClock,
        Duration::from_secs(300),
        Duration::ZERO,
    );
    let state = RouterState::new(registry, SECRET, PermissiveValidator);
    crate::router(state)
}

fn owner_token(actor_id: &str) -> String {
    let address = ActorAddress::new("todo", actor_id);
    let owner = Caller::client("11111111-1111-1111-1111-111111111111");
    ak_auth::issue_access(SECRET, &address, &owner)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_without_token_is_unauthorized() {
    let response = app().oneshot(Request::builder().uri("/api/todo/L1").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_then_get_round_trips_through_the_router() {
    let app = app();
    let token = owner_token("L1");

    let post_req = Request::builder()
        .method("POST")
        .uri("/api/todo/L1")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(json!({"type": "ADD_TODO", "text": "buy milk"}).to_string()))
        .unwrap();
    let post_resp = app.clone().oneshot(post_req).await.unwrap();
    assert_eq!(post_resp.status(), StatusCode::OK);
    assert_eq!(body_json(post_resp).await, json!({"ok": true}));

    let get_req =
        Request::builder().uri("/api/todo/L1").header("authorization", format!("Bearer {token}")).body(Body::empty()).unwrap();
    let get_resp = app.oneshot(get_req).await.unwrap();
    assert_eq!(get_resp.status(), StatusCode::OK);
    let body = body_json(get_resp).await;
    assert_eq!(body["snapshot"]["public"]["todos"][0]["text"], "buy milk");
}

#[tokio::test]
async fn post_with_caller_field_in_body_is_rejected() {
    let app = app();
    let token = owner_token("L1");
    let req = Request::builder()
        .method("POST")
        .uri("/api/todo/L1")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(json!({"type": "ADD_TODO", "text": "x", "caller": {"type": "client", "id": "evil"}}).to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_actor_type_is_not_found() {
    let response =
        app().oneshot(Request::builder().uri("/api/not-todo/L1").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_is_method_not_allowed() {
    let token = owner_token("L1");
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/todo/L1")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn wait_for_state_already_ready_returns_immediately() {
    let app = app();
    let token = owner_token("L1");
    // First contact spawns the actor.
    let _ = app
        .clone()
        .oneshot(Request::builder().uri("/api/todo/L1").header("authorization", format!("Bearer {token}")).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let req = Request::builder()
        .uri("/api/todo/L1?waitForState=Ready")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wait_for_unreachable_state_times_out_with_408() {
    let app = app();
    let token = owner_token("L1");
    let req = Request::builder()
        .uri("/api/todo/L1?waitForState=NeverReached&timeout=50&errorOnWaitTimeout=true")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
