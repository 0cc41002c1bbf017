//! Axum router setup for the Trellis server

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{
    handlers::{get_graph, get_node, health_check, trigger_rebuild},
    websocket::ws_handler,
    ServerState,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // WebSocket endpoint for graph messages
        .route("/ws", get(ws_handler))
        // REST API endpoints
        .route("/api/graph", get(get_graph))
        // Node ids contain `/`, so the id is a wildcard segment.
        .route("/api/nodes/*id", get(get_node))
        .route("/api/rebuild", post(trigger_rebuild))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
