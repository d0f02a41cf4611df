//! Axum router setup for the terragraph server

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;

use crate::{
    ServerState,
    handlers::{
        get_context, get_expand, get_graph, get_neighbors, get_summary, health_check,
        post_rescan, put_description,
    },
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/graph", get(get_graph))
        .route("/api/summary", get(get_summary))
        .route("/api/neighbors", get(get_neighbors))
        .route("/api/expand", get(get_expand))
        .route("/api/context", get(get_context))
        .route("/api/description", put(put_description))
        .route("/api/rescan", post(post_rescan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
