// SPDX-License-Identifier: MIT

//! Central error→HTTP mapping (spec §7), the single place a crate-local
//! error becomes a wire response — grounded in the teacher's `Response`
//! tagged enum (examples/alfredjeanlab-oddjobs/crates/wire/src/response.rs),
//! generalized from an IPC response to an axum `IntoResponse`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use ak_host::HostError;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("event failed validation: {0}")]
    BadEvent(String),
    #[error("unknown actor type {0:?}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("wait timed out")]
    WaitTimeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<HostError> for RouterError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::BadEvent => RouterError::BadEvent("event rejected by host".to_string()),
            HostError::WaitTimeout => RouterError::WaitTimeout,
            HostError::NotReady => RouterError::Internal("actor not ready".to_string()),
            HostError::AlreadySpawnedDifferent { actor } => {
                RouterError::Internal(format!("actor {actor} already spawned with different identity"))
            }
            HostError::Internal(msg) => RouterError::Internal(msg),
        }
    }
}

impl From<ak_auth::TokenError> for RouterError {
    fn from(e: ak_auth::TokenError) -> Self {
        RouterError::Unauthorized(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RouterError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                format!("{msg} — mint a token with ak_auth::issue_access for this actor before calling the API"),
            ),
            RouterError::BadEvent(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            RouterError::NotFound(actor_type) => (StatusCode::NOT_FOUND, format!("no such actor type {actor_type:?}")),
            RouterError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            RouterError::WaitTimeout => (StatusCode::REQUEST_TIMEOUT, self.to_string()),
            RouterError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        (status, Json(ErrorBody { ok: false, error: message })).into_response()
    }
}
