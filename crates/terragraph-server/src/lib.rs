//! HTTP server exposing the dependency graph queries

pub mod error;
pub mod handlers;
pub mod router;

use std::net::SocketAddr;
use std::sync::Arc;

use terragraph_core::DependencyGraph;
use terragraph_indexer::Session;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};

pub use error::ApiError;
pub use router::create_router;

/// Shared state behind every handler.
///
/// The graph is read-mostly; a rescan builds a new one under the session
/// lock and swaps it in.
pub struct ServerState {
    pub graph: RwLock<DependencyGraph>,
    pub session: Mutex<Session>,
}

impl ServerState {
    pub fn new(graph: DependencyGraph, session: Session) -> Self {
        ServerState {
            graph: RwLock::new(graph),
            session: Mutex::new(session),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7411,
        }
    }
}

pub struct TerragraphServer {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl TerragraphServer {
    pub fn new(graph: DependencyGraph, session: Session, config: ServerConfig) -> Self {
        TerragraphServer {
            state: Arc::new(ServerState::new(graph, session)),
            config,
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        let app = create_router(self.state);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
