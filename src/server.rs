//! HTTP server for the admin panel.
//!
//! One `Store` is built at startup from the configured path and shared with
//! every handler through `AppState`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::errors::AppError;
use crate::handlers;
use crate::paths::resolve_state_path;
use crate::state::Store;
use crate::templates::{MiniJinjaEngine, TemplateEngine};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Location of the state document.
    pub state_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(
                DEFAULT_HOST
                    .parse()
                    .unwrap_or_else(|_| std::net::Ipv4Addr::UNSPECIFIED.into()),
                DEFAULT_PORT,
            ),
            state_path: resolve_state_path(None),
        }
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    pub store: Store,
    pub templates: Box<dyn TemplateEngine>,
    /// Serializes read-modify-write cycles so concurrent posts don't lose updates.
    pub write_lock: Mutex<()>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self::with_templates(store, Box::new(MiniJinjaEngine::new()))
    }

    pub fn with_templates(store: Store, templates: Box<dyn TemplateEngine>) -> Self {
        Self {
            store,
            templates,
            write_lock: Mutex::new(()),
        }
    }
}

/// Builds the router with all admin routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/fillers/add", post(handlers::add_filler))
        .route("/fillers/delete", post(handlers::delete_filler))
        .route("/replacements/upsert", post(handlers::upsert_replacement))
        .route("/replacements/delete", post(handlers::delete_replacement))
        .route("/history/clear", post(handlers::clear_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        let store = Store::new(config.state_path.clone());
        let state = Arc::new(AppState::new(store));
        Self { config, state }
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the state file
    /// cannot be created.
    pub async fn run(self) -> Result<(), AppError> {
        // Fail fast on an unusable state path instead of on the first request.
        self.state.store.read()?;
        info!(path = %self.state.store.path().display(), "Using state file");

        if !self.config.addr.ip().is_loopback() {
            warn!(
                addr = %self.config.addr,
                "Admin panel has no authentication and is reachable beyond localhost"
            );
        }

        let router = router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", self.config.addr, e)))?;

        info!(addr = %self.config.addr, "Voice polish admin listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Server(e.to_string()))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
