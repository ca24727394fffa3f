//! Dashboard server
//!
//! # Endpoints
//!
//! - `GET /` - Dashboard page (`?vehicle=&day=`)
//! - `POST /upload` - Multipart upload of one or more input files
//! - `POST /clear/{slot}` - Remove one uploaded file
//! - `GET /api/view` - View model as JSON
//! - `GET /plot.svg` - Route overview chart
//! - `GET /health` - Health check
//! - `GET /api-docs/openapi.json` - OpenAPI document
//!
//! Uploads live in memory, per browser session, and are dropped once the
//! session has been idle longer than its TTL.

pub mod api;
pub mod session;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub use api::build_router;
pub use session::SessionStore;

/// Listening address and limits for `delivery-dash serve`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 64 * 1024 * 1024,
            session_ttl: Duration::from_secs(120 * 60),
        }
    }
}

/// Shared state behind every handler
pub struct AppState {
    pub sessions: SessionStore,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Start the server and run until Ctrl-C
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::new(&config));
    spawn_session_pruner(Arc::clone(&state), config.session_ttl);

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        address = %addr,
        max_upload_bytes = config.max_upload_bytes,
        session_ttl_s = config.session_ttl.as_secs(),
        "Dashboard server listening"
    );
    println!("🌐 Dashboard on http://{addr}/");
    println!("📖 OpenAPI: http://{addr}/api-docs/openapi.json");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Dashboard server stopped");
    Ok(())
}

fn spawn_session_pruner(state: Arc<AppState>, ttl: Duration) {
    let period = ttl.clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            state.sessions.prune();
        }
    });
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
