// SPDX-License-Identifier: MIT

//! `GET /healthz` (SPEC_FULL.md §11), grounded in the teacher's
//! `Status` response (`oj-daemon`'s own uptime/process query) and
//! SpacetimeDB's `routes::health`: a small always-200 JSON body a
//! load balancer or orchestrator can poll, not an authenticated route.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
    pub live_actor_count: Arc<dyn Fn() -> usize + Send + Sync>,
}

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
    uptime_secs: u64,
    live_actors: usize,
}

pub async fn healthz(State(state): State<HealthState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        live_actors: (state.live_actor_count)(),
    })
}
