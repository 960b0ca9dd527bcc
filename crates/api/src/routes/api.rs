use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use common::EngineCommand;

use crate::{auth::require_auth, AppState};

pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/archive", get(get_archive))
        .route("/api/clear", post(post_clear))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

/// The full display snapshot: price, classification, score, Fibonacci levels,
/// session flag, trade reference, advisory, plan, and archive. The dashboard
/// renders these values and computes nothing.
async fn get_snapshot(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.snapshot_rx.borrow().clone();
    let engine_state = *state.engine_state.read().await;
    Json(json!({
        "engine": engine_state.to_string(),
        "snapshot": snapshot,
    }))
}

// ─── Archive ──────────────────────────────────────────────────────────────────

async fn get_archive(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(json!({
        "entries": snapshot.archive,
        "count": snapshot.archive.len(),
    }))
}

// ─── Clear ────────────────────────────────────────────────────────────────────

/// The one mutation the dashboard exposes: empty the archive and reset the
/// trade reference as a single engine-side operation.
async fn post_clear(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    info!("Clear requested from the dashboard");
    match state.command_tx.send(EngineCommand::ClearSession).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "cleared" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "engine unavailable" })),
        ),
    }
}
