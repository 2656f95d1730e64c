//! API server implementation
//!
//! Owns the shared state, wraps the router in the configured middleware and
//! runs it on a tokio listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::config::ServerConfig;
use super::routes::create_router;
use crate::error::{Error, Result};
use crate::metrics;
use crate::storage::{Pagination, SharedStore, SqliteStore};

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub store: SharedStore,

    /// Configuration
    pub config: Arc<ServerConfig>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: SharedStore, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Run a storage call on the blocking pool
    pub async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::with_source("Storage task failed", e))?
    }

    /// Page request capped by `max_page_size`
    pub fn pagination(&self, page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Pagination {
        Pagination::new(page, limit, default_limit, self.config.max_page_size)
    }
}

// ============================================================================
// API Server
// ============================================================================

/// Dashboard API server
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new server over an opened store
    pub fn new(config: ServerConfig, store: SharedStore) -> std::result::Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let state = AppState::new(store, config.clone());
        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::result::Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(address = %addr, "Starting API server");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("API server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            max_page_size: self.config.max_page_size,
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Router with CORS, tracing and request metrics applied per the state's config
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let mut router = create_router(state).route_layer(middleware::from_fn(track_metrics));

    if config.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    if config.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Record count and latency of every routed request
async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_api_request(
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub max_page_size: u32,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "edumon API Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Max Page Size: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.max_page_size,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to bind: {0}")]
    BindError(String),

    #[error("Server error: {0}")]
    ServeError(String),
}

// ============================================================================
// Tests
// ============================================================================
