//! REST API handlers for the terragraph server

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use axum_extra::extract::Query as MultiQuery;
use serde::{Deserialize, Serialize};
use terragraph_core::{Direction, GraphExport, GraphSummary, Hops};
use terragraph_indexer::ScanReport;

use crate::{ApiError, ServerState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct NeighborsQuery {
    pub path: String,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct NeighborsResponse {
    pub path: String,
    pub direction: Direction,
    pub neighbors: Vec<String>,
}

/// `seeds` repeats: `?seeds=a.tf&seeds=b.tf`. No `hops` means unbounded.
#[derive(Debug, Deserialize)]
pub struct ExpandQuery {
    #[serde(default)]
    pub seeds: Vec<String>,
    pub hops: Option<usize>,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub seeds: Vec<String>,
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub path: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct RescanResponse {
    pub report: ScanReport,
    pub summary: GraphSummary,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get the current graph as node and edge lists
pub async fn get_graph(State(state): State<Arc<ServerState>>) -> Json<GraphExport> {
    let graph = state.graph.read().await;
    Json(graph.interchange())
}

pub async fn get_summary(State(state): State<Arc<ServerState>>) -> Json<GraphSummary> {
    let graph = state.graph.read().await;
    Json(graph.summary())
}

pub async fn get_neighbors(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<NeighborsQuery>,
) -> Result<Json<NeighborsResponse>, ApiError> {
    let graph = state.graph.read().await;
    let neighbors = graph.neighbors(&query.path, query.direction)?;
    Ok(Json(NeighborsResponse {
        path: query.path,
        direction: query.direction,
        neighbors,
    }))
}

pub async fn get_expand(
    State(state): State<Arc<ServerState>>,
    MultiQuery(query): MultiQuery<ExpandQuery>,
) -> Result<Json<ExpandResponse>, ApiError> {
    if query.seeds.is_empty() {
        return Err(ApiError::BadRequest("at least one seed is required".to_string()));
    }
    let graph = state.graph.read().await;
    let paths = graph.expand_directed(query.seeds.as_slice(), Hops::from(query.hops), query.direction)?;
    Ok(Json(ExpandResponse {
        seeds: query.seeds,
        paths: paths.into_iter().collect(),
    }))
}

/// Prompt context as plain text. No `paths` renders every scanned file.
pub async fn get_context(
    State(state): State<Arc<ServerState>>,
    MultiQuery(query): MultiQuery<ContextQuery>,
) -> Result<String, ApiError> {
    let graph = state.graph.read().await;
    Ok(graph.prompt_context(query.paths.as_slice())?)
}

pub async fn put_description(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut session = state.session.lock().await;
    let mut graph = state.graph.write().await;
    session.describe(&mut graph, &request.path, request.description)?;
    tracing::debug!("Description set for {}", request.path);
    Ok(Json(serde_json::json!({ "path": request.path })))
}

/// Rebuild the graph through the session and swap it in
pub async fn post_rescan(State(state): State<Arc<ServerState>>) -> Result<Json<RescanResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let (graph, report) = session.scan()?;
    let summary = graph.summary();
    *state.graph.write().await = graph;
    Ok(Json(RescanResponse { report, summary }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;
    use terragraph_indexer::{IndexConfig, Session};

    fn scenario_state() -> (TempDir, Arc<ServerState>) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("net")).unwrap();
        fs::write(
            root.join("main.tf"),
            "module \"net\" {\n  source = \"./net\"\n}\n\nmodule \"dns\" {\n  source = \"hashicorp/dns/aws\"\n}\n",
        )
        .unwrap();
        fs::write(root.join("net/main.tf"), "variable \"cidr\" {}\n").unwrap();

        let mut session = Session::new(root, IndexConfig::default());
        let (graph, _) = session.scan().unwrap();
        (dir, Arc::new(ServerState::new(graph, session)))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_graph_and_summary() {
        let (_dir, state) = scenario_state();

        let Json(export) = get_graph(State(Arc::clone(&state))).await;
        assert_eq!(export.nodes.len(), 3);
        assert_eq!(export.edges.len(), 2);

        let Json(summary) = get_summary(State(state)).await;
        assert_eq!(summary.node_count, 3);
    }

    #[tokio::test]
    async fn test_neighbors() {
        let (_dir, state) = scenario_state();
        let query = NeighborsQuery {
            path: "net/main.tf".to_string(),
            direction: Direction::Incoming,
        };

        let Json(response) = get_neighbors(State(state), Query(query)).await.unwrap();
        assert_eq!(response.neighbors, vec!["main.tf"]);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let (_dir, state) = scenario_state();
        let query = NeighborsQuery {
            path: "missing.tf".to_string(),
            direction: Direction::Outgoing,
        };

        let err = get_neighbors(State(state), Query(query)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_expand() {
        let (_dir, state) = scenario_state();
        let query = ExpandQuery {
            seeds: vec!["main.tf".to_string()],
            hops: Some(0),
            direction: Direction::Outgoing,
        };
        let Json(response) = get_expand(State(Arc::clone(&state)), MultiQuery(query)).await.unwrap();
        assert_eq!(response.paths, vec!["main.tf"]);

        let query = ExpandQuery {
            seeds: vec!["main.tf".to_string()],
            hops: None,
            direction: Direction::Outgoing,
        };
        let Json(response) = get_expand(State(state), MultiQuery(query)).await.unwrap();
        assert_eq!(response.paths, vec!["hashicorp/dns/aws", "main.tf", "net/main.tf"]);
    }

    #[tokio::test]
    async fn test_expand_without_seeds_is_400() {
        let (_dir, state) = scenario_state();
        let query = ExpandQuery {
            seeds: Vec::new(),
            hops: None,
            direction: Direction::Outgoing,
        };
        let err = get_expand(State(state), MultiQuery(query)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_description_then_context() {
        let (_dir, state) = scenario_state();
        let request = DescriptionRequest {
            path: "net/main.tf".to_string(),
            description: "Network module".to_string(),
        };
        put_description(State(Arc::clone(&state)), Json(request)).await.unwrap();

        let query = ContextQuery {
            paths: vec!["net/main.tf".to_string()],
        };
        let text = get_context(State(state), MultiQuery(query)).await.unwrap();
        assert!(text.contains("Description: Network module"));
        assert!(text.contains("Dependencies: none"));
    }

    #[tokio::test]
    async fn test_rescan_picks_up_new_files() {
        let (dir, state) = scenario_state();
        fs::write(dir.path().join("outputs.tf"), "output \"x\" {\n  value = 1\n}\n").unwrap();

        let Json(response) = post_rescan(State(Arc::clone(&state))).await.unwrap();
        assert_eq!(response.report.files, 3);
        assert_eq!(response.summary.node_count, 4);
        assert!(state.graph.read().await.contains("outputs.tf"));
    }
}
