// SPDX-License-Identifier: MIT

//! Demo process: wires the nine library crates into one runnable
//! actor-kit server serving a single actor type,
//! [`ak_machine::todo::TodoMachine`] (spec §1 "an actor-kit server
//! serves one or more actor types"; SPEC_FULL.md §2 "ak-daemon: binary
//! | wires the above into a runnable process").
//!
//! Grounded in the teacher's `oj-daemon` lifecycle: acquire resources,
//! serve, then drain on shutdown (`lifecycle::startup` /
//! `lifecycle::mod::Config`), generalized from a Unix-socket IPC daemon
//! to an axum HTTP/WebSocket server.

mod env;
mod health;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ak_core::SystemClock;
use ak_machine::todo::TodoMachine;
use ak_router::{PermissiveValidator, Registry, RouterState};
use ak_storage::FileSnapshotStore;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let signing_key = env::signing_key()?;
    let host = env::host();
    let state_dir = env::state_dir();
    let cache_ttl = env::cache_ttl();
    let persist_debounce = env::persist_debounce();

    std::fs::create_dir_all(&state_dir)?;
    tracing::info!(state_dir = %state_dir.display(), %host, ?cache_ttl, ?persist_debounce, "starting actor-kit daemon");

    let store = Arc::new(FileSnapshotStore::new(state_dir.join("todo")));
    let registry: Registry<TodoMachine, _, _> = Registry::new("todo", store, SystemClock, cache_ttl, persist_debounce);

    let router_state = RouterState::new(registry, signing_key, PermissiveValidator);
    let registry_handle = Arc::clone(&router_state.registry);

    let health_state = health::HealthState {
        start_time: Instant::now(),
        live_actor_count: Arc::new(move || registry_handle.live_actor_count()),
    };
    let flush_handle = Arc::clone(&router_state.registry);

    let health_router = Router::new().route("/healthz", get(health::healthz)).with_state(health_state);
    let api_router = ak_router::router(router_state);

    let app = Router::new().merge(health_router).merge(api_router).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&host).await?;
    tracing::info!(%host, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("shutdown signal received, draining pending persistence writes");
    match tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, flush_handle.flush_all()).await {
        Ok(()) => tracing::info!("drained cleanly"),
        Err(_) => tracing::warn!("drain timed out after {:?}", SHUTDOWN_DRAIN_TIMEOUT),
    }

    Ok(())
}

/// Resolves once `ctrl_c` fires, handing control back to
/// [`axum::serve`]'s graceful-shutdown machinery: it stops accepting
/// new connections and lets in-flight requests (including open
/// WebSocket upgrades) finish before `serve` returns (SPEC_FULL.md
/// §11 "graceful shutdown").
async fn shutdown_signal() {
    let ctrl_c = async {
        #[allow(clippy::expect_used)]
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        #[allow(clippy::expect_used)]
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
