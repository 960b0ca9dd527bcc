use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::warn;

use common::DisplaySnapshot;

use crate::AppState;

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/snapshots", get(ws_snapshots_handler))
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// WebSocket endpoint that pushes every new display snapshot to the
/// dashboard. Auth via query param `?token=<DASHBOARD_TOKEN>` (header auth
/// not supported in browser WebSocket API).
async fn ws_snapshots_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(q): Query<WsQuery>,
) -> Response {
    let authed = q
        .token
        .as_deref()
        .map(|t| t == state.dashboard_token)
        .unwrap_or(false);

    if !authed {
        return axum::response::IntoResponse::into_response((
            axum::http::StatusCode::UNAUTHORIZED,
            "unauthorized",
        ));
    }

    let snapshot_rx = state.snapshot_rx.clone();
    ws.on_upgrade(move |socket| handle_ws(socket, snapshot_rx))
}

async fn handle_ws(mut socket: WebSocket, mut snapshot_rx: watch::Receiver<DisplaySnapshot>) {
    // Send the current snapshot first so the client renders immediately
    let snapshot = snapshot_rx.borrow().clone();
    if send_snapshot(&mut socket, &snapshot).await.is_err() {
        return;
    }

    // Then push each new snapshot as the engine publishes it
    while snapshot_rx.changed().await.is_ok() {
        let snapshot = snapshot_rx.borrow().clone();
        if send_snapshot(&mut socket, &snapshot).await.is_err() {
            break;
        }
    }
}

async fn send_snapshot(socket: &mut WebSocket, snapshot: &DisplaySnapshot) -> Result<(), ()> {
    let text = match serde_json::to_string(snapshot) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to serialize snapshot for WebSocket");
            return Ok(());
        }
    };
    socket.send(Message::Text(text)).await.map_err(|_| ())
}
