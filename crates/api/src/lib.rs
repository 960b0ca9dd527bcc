mod auth;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::{mpsc, watch, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{DisplaySnapshot, EngineCommand, EngineState};

/// Shared application state injected into every route handler.
///
/// Everything here is read-only except `command_tx`, which carries the single
/// mutation the dashboard may trigger: the explicit clear action.
#[derive(Clone)]
pub struct AppState {
    pub engine_state: Arc<RwLock<EngineState>>,
    pub snapshot_rx: watch::Receiver<DisplaySnapshot>,
    pub command_tx: mpsc::Sender<EngineCommand>,
    pub dashboard_token: String,
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    let app = Router::new()
        .merge(routes::api_router(state.clone()))
        .merge(routes::ws_router())
        .merge(routes::health_router())
        .merge(routes::static_router())
        .with_state(state)
        .layer(cors);

    info!(%addr, "Dashboard API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
