// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use newsmith_core::NewsmithError;
use newsmith_orchestrator::Orchestrator;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;
use crate::stream::ProgressHub;

/// Shared state for request handlers.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    pub progress: Arc<ProgressHub>,
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the gateway router.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/workflows/execute", post(handlers::execute_workflow))
        .route("/workflows/active", get(handlers::active_workflows))
        .route("/workflows/:id/status", get(handlers::workflow_status))
        .route("/workflows/:id", delete(handlers::cancel_workflow))
        .route("/users/:id/updates", get(handlers::progress_updates))
        .route("/users/:id/conversation", delete(handlers::clear_conversation))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the server and runs until the cancellation token fires.
pub async fn start_server(
    config: &ServerConfig,
    state: Arc<GatewayState>,
    shutdown: CancellationToken,
) -> Result<(), NewsmithError> {
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        NewsmithError::unavailable("GATEWAY_BIND_FAILED", format!("failed to bind {addr}: {e}"))
            .with_cause(e)
    })?;

    info!(addr = addr.as_str(), "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| {
            NewsmithError::internal("GATEWAY_SERVER_ERROR", format!("gateway server error: {e}"))
                .with_cause(e)
        })
}
