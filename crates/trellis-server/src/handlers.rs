//! REST API handlers for the Trellis server

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{info, warn};
use trellis_core::{GraphEdge, GraphNode, GraphView, NodeId};

use crate::ServerState;

/// One node with its neighbourhood
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResponse {
    pub node: GraphNode,
    pub outgoing: Vec<GraphEdge>,
    pub incoming: Vec<GraphEdge>,
    pub callees: Vec<NodeId>,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub has_graph: bool,
    pub subscribers: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Get the current graph snapshot as JSON
pub async fn get_graph(State(state): State<Arc<ServerState>>) -> Response {
    match state.session.snapshot().await {
        Some(graph) => Json(graph).into_response(),
        None => error(StatusCode::NOT_FOUND, "no graph has been built yet"),
    }
}

/// Get one node and the edges touching it
pub async fn get_node(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> Response {
    let Some(graph) = state.session.snapshot().await else {
        return error(StatusCode::NOT_FOUND, "no graph has been built yet");
    };
    let Some(node) = graph.node(&id) else {
        return error(StatusCode::NOT_FOUND, format!("unknown node {id}"));
    };

    let view = GraphView::new(&graph);
    let response = NodeResponse {
        node: node.clone(),
        outgoing: view.outgoing(&id).into_iter().cloned().collect(),
        incoming: view.incoming(&id).into_iter().cloned().collect(),
        callees: view.callees(&id).into_iter().map(|n| n.id.clone()).collect(),
    };
    Json(response).into_response()
}

/// Rebuild now, bypassing the debouncer
pub async fn trigger_rebuild(State(state): State<Arc<ServerState>>) -> Response {
    info!("Manual rebuild requested");
    match state.session.rebuild().await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            warn!("Manual rebuild failed: {:#}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        has_graph: state.session.snapshot().await.is_some(),
        subscribers: state.session.subscriber_count(),
    })
}
