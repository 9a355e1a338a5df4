//! HTTP routes for the session service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{LifecycleManager, NotificationSink, SessionTokenIssuer};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::clock::Clock;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Owner of all session transitions.
    pub lifecycle: Arc<LifecycleManager>,

    /// Receives composed lifecycle notifications.
    pub notifier: Arc<dyn NotificationSink>,

    /// Signs tokens handed out on join.
    pub token_issuer: SessionTokenIssuer,

    /// Time source for token issuance.
    pub clock: Arc<dyn Clock>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK")
/// - `/ready` - Readiness probe (session store reachable)
/// - `/metrics` - Prometheus metrics endpoint
/// - `/api/v1/sessions` - Create and list sessions
/// - `/api/v1/sessions/{id}` - Fetch a session
/// - `/api/v1/sessions/{id}/join` - Join a session
/// - `/api/v1/sessions/{id}/end` - End a session
/// - `/api/v1/sessions/{id}/recordings` - List recordings
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route(
            "/api/v1/sessions",
            post(handlers::create_session).get(handlers::list_sessions),
        )
        .route("/api/v1/sessions/:id", get(handlers::get_session))
        .route("/api/v1/sessions/:id/join", post(handlers::join_session))
        .route("/api/v1/sessions/:id/end", post(handlers::end_session))
        .route(
            "/api/v1/sessions/:id/recordings",
            get(handlers::list_recordings),
        )
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
