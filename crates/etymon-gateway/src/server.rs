// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use etymon_autocomplete::AutocompleteIndex;
use etymon_core::{EphemeralStore, EtymonError};
use etymon_ratelimit::RateLimiter;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub limiter: RateLimiter,
    pub autocomplete: AutocompleteIndex,
    /// Pinged by `/health`.
    pub store: Arc<dyn EphemeralStore>,
    /// Default and cap for the autocomplete `limit` parameter.
    pub max_suggestions: usize,
    /// Optional Prometheus metrics render function for `/metrics`.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Gateway server configuration (mirrors GatewayConfig from etymon-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/limits/check", post(handlers::post_limit_check))
        .route("/api/limits", get(handlers::get_limits))
        .route("/api/autocomplete", get(handlers::get_autocomplete))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind to the configured host:port and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), EtymonError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EtymonError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| EtymonError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
