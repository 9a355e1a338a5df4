//! Session Service
//!
//! Entry point for the tutoring center's virtual session API.

use common::clock::{Clock, SystemClock};
use session_service::config::Config;
use session_service::observability::metrics::init_metrics_recorder;
use session_service::repositories::InMemorySessionStore;
use session_service::routes::{self, AppState};
use session_service::services::{
    CsprngIdGenerator, LifecycleManager, LifecycleSettings, SessionTokenIssuer,
    TracingNotificationSink,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Session Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        default_session_minutes = config.default_session_minutes,
        recording_retention_days = config.recording_retention_days,
        session_token_ttl_seconds = config.session_token_ttl_seconds,
        "Configuration loaded successfully"
    );

    // Must be installed before any metrics are recorded
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let lifecycle = Arc::new(LifecycleManager::new(
        Arc::new(InMemorySessionStore::new()),
        clock.clone(),
        Arc::new(CsprngIdGenerator::new()),
        LifecycleSettings::from(&config),
    ));

    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        token_issuer: SessionTokenIssuer::from_config(&config),
        config,
        lifecycle,
        notifier: Arc::new(TracingNotificationSink),
        clock,
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Session Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Session Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    let drain_secs: u64 = std::env::var("SESSION_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (SESSION_DRAIN_SECONDS=0)");
    }
}
