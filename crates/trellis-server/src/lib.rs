//! HTTP + WebSocket server

pub mod handlers;
pub mod router;
pub mod websocket;


use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use trellis_watcher::SyncSession;

pub use router::create_router;

/// Listen address of the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7890,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// State shared by every handler.
pub struct ServerState {
    pub session: Arc<SyncSession>,
}

impl ServerState {
    pub fn new(session: Arc<SyncSession>) -> Self {
        ServerState { session }
    }
}

/// The graph server: REST snapshot access plus the WebSocket message stream.
pub struct TrellisServer {
    config: ServerConfig,
    state: Arc<ServerState>,
}

impl TrellisServer {
    pub fn new(config: ServerConfig, session: Arc<SyncSession>) -> Self {
        TrellisServer {
            config,
            state: Arc::new(ServerState::new(session)),
        }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Bind the configured address and serve until the process stops.
    pub async fn run(self) -> Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("binding {address}"))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr().context("reading listener address")?;
        info!("Trellis server listening on http://{}", local);
        axum::serve(listener, create_router(self.state))
            .await
            .context("serving HTTP")?;
        Ok(())
    }
}
