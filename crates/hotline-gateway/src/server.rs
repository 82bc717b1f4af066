// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use hotline_config::model::GatewayConfig;
use hotline_core::{HotlineError, StorageAdapter};
use hotline_desk::Intake;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Question store, read by the status endpoint.
    pub store: Arc<dyn StorageAdapter>,
    /// Submission path shared with the chat flow.
    pub intake: Intake,
    /// Root directory for decoded web uploads.
    pub upload_dir: PathBuf,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Name shown by `GET /`.
    pub service_name: String,
}

/// Bind address and auth settings for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    pub auth: AuthConfig,
    /// Request body cap for the web form route.
    pub max_body_bytes: usize,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            auth: AuthConfig {
                bearer_token: config.bearer_token.clone(),
            },
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Builds the gateway router.
///
/// - `GET /` and `GET /health` are public
/// - `POST /api/v1/web-question` and `GET /api/v1/questions/{id}` sit behind
///   the bearer check
/// - the web form route accepts bodies up to `max_body_bytes`
pub fn router(state: GatewayState, auth: AuthConfig, max_body_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/api/v1/web-question",
            post(handlers::post_web_question).layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .route("/api/v1/questions/{id}", get(handlers::get_question))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), HotlineError> {
    let app = router(state, config.auth.clone(), config.max_body_bytes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HotlineError::channel(format!("failed to bind gateway to {addr}"), e))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| HotlineError::channel("gateway server error", e))?;

    tracing::info!("gateway stopped");
    Ok(())
}
