// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use tally_config::model::GatewayConfig;
use tally_core::TallyError;
use tally_service::CounterService;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The counter operations.
    pub service: CounterService,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(service: CounterService) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

/// Build the application router.
///
/// Routes:
/// - GET /health
/// - GET /v1/counter
/// - POST /v1/counter/increment
/// - POST /v1/counter/reset
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/counter", get(handlers::get_counter))
        .route("/v1/counter/increment", post(handlers::increment_counter))
        .route("/v1/counter/reset", post(handlers::reset_counter))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `config.host:config.port` and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), TallyError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TallyError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| TallyError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
