// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `etymon serve` command implementation.
//!
//! Connects the ephemeral store, builds the limiter and autocomplete index
//! on top of it and serves the HTTP gateway until a shutdown signal.

use std::sync::Arc;

use etymon_autocomplete::AutocompleteIndex;
use etymon_config::EtymonConfig;
use etymon_core::EtymonError;
use etymon_gateway::{GatewayState, ServerConfig, start_server};
use etymon_prometheus::PrometheusExporter;
use etymon_ratelimit::{LimitTable, RateLimiter};
use tracing::{info, warn};

use crate::shutdown::shutdown_signal;

/// Run the gateway. An unreachable store fails before anything binds.
pub async fn run_serve(config: EtymonConfig) -> Result<(), EtymonError> {
    info!("starting etymon serve");

    let store = etymon_ephemeral::open_store(&config.store).await?;

    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.prometheus.enabled {
            let exporter = PrometheusExporter::install()?;
            Some(Arc::new(move || exporter.render()))
        } else {
            None
        };

    let limits = Arc::new(LimitTable::from_config(&config.limits));
    for (action, limit) in limits.iter() {
        info!(
            action,
            limit = limit.limit,
            window_secs = limit.window_seconds(),
            "rate limit loaded"
        );
    }

    let autocomplete = AutocompleteIndex::new(Arc::clone(&store));
    match autocomplete.count().await {
        Ok(words) => info!(words, "autocomplete index available"),
        Err(e) => warn!(error = %e, "could not read autocomplete vocabulary size"),
    }

    let state = GatewayState {
        limiter: RateLimiter::new(Arc::clone(&store), limits),
        autocomplete,
        store,
        max_suggestions: config.autocomplete.max_suggestions,
        prometheus_render,
    };

    let server = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    start_server(&server, state, shutdown_signal()).await?;

    info!("etymon serve shut down cleanly");
    Ok(())
}
