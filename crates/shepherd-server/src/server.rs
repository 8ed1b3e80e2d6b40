//! HTTP server implementation using Axum.

use crate::handler::{handle_api, handle_health, handle_index, handle_static};
use axum::{routing::get, Router};
use shepherd_core::{ControlEndpoint, ProcessRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// `/api` operations
    pub endpoint: ControlEndpoint,
}

impl AppState {
    pub fn new(endpoint: ControlEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        self.endpoint.registry()
    }
}

/// Build the dashboard router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // The dashboard script may be opened from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/api", get(handle_api).post(handle_api))
        .route("/static/*path", get(handle_static))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the dashboard HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = build_router(state);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
