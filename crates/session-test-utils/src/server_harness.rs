//! Test server harness for E2E testing
//!
//! Provides `TestSessionServer` for spawning real session service instances
//! in tests, driven by a manual clock and a collecting notification sink.

use chrono::{DateTime, TimeZone, Utc};
use common::clock::ManualClock;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use session_service::config::Config;
use session_service::observability::metrics::init_metrics_recorder;
use session_service::repositories::InMemorySessionStore;
use session_service::routes::{self, AppState};
use session_service::services::{
    CollectingNotificationSink, LifecycleManager, LifecycleSettings, SequentialIdGenerator,
    SessionTokenIssuer,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Signing secret used by every test server.
pub const TEST_SESSION_TOKEN_SECRET: &str = "test-session-token-secret-0123456789";

/// Join link base used by every test server.
pub const TEST_JOIN_BASE_URL: &str = "https://tutoring.test/join";

/// Recording link base used by every test server.
pub const TEST_RECORDING_BASE_URL: &str = "https://media.tutoring.test/recordings";

/// Instant the test clock starts at.
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 14, 16, 0, 0)
        .single()
        .expect("valid test epoch")
}

/// Configuration shared by test servers.
pub fn test_config() -> Config {
    let vars = HashMap::from([
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        (
            "SESSION_TOKEN_SECRET".to_string(),
            TEST_SESSION_TOKEN_SECRET.to_string(),
        ),
        ("JOIN_BASE_URL".to_string(), TEST_JOIN_BASE_URL.to_string()),
        (
            "RECORDING_BASE_URL".to_string(),
            TEST_RECORDING_BASE_URL.to_string(),
        ),
    ]);

    Config::from_vars(&vars).expect("test config should be valid")
}

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the session service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_join_flow() -> Result<(), anyhow::Error> {
///     let server = TestSessionServer::spawn().await?;
///     server.clock().advance(chrono::Duration::minutes(1));
///     // ...
///     Ok(())
/// }
/// ```
pub struct TestSessionServer {
    addr: SocketAddr,
    config: Config,
    clock: Arc<ManualClock>,
    notifications: Arc<CollectingNotificationSink>,
    lifecycle: Arc<LifecycleManager>,
    _handle: JoinHandle<()>,
}

impl TestSessionServer {
    /// Spawn a new test server instance with an empty in-memory store.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Use a manual clock starting at [`test_epoch`]
    /// - Hand out sequential session ids
    /// - Collect notifications instead of delivering them
    ///
    /// # Returns
    /// * `Ok(TestSessionServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let config = test_config();
        let clock = Arc::new(ManualClock::new(test_epoch()));
        let notifications = Arc::new(CollectingNotificationSink::new());

        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::new(InMemorySessionStore::new()),
            clock.clone(),
            Arc::new(SequentialIdGenerator::new()),
            LifecycleSettings::from(&config),
        ));

        let state = Arc::new(AppState {
            config: config.clone(),
            lifecycle: lifecycle.clone(),
            notifier: notifications.clone(),
            token_issuer: SessionTokenIssuer::from_config(&config),
            clock: clock.clone(),
        });

        // Build routes using session-service's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            clock,
            notifications,
            lifecycle,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clock driving every time-window decision in the server.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Notifications the server has published so far.
    pub fn notifications(&self) -> &CollectingNotificationSink {
        &self.notifications
    }

    /// Direct access to the lifecycle manager behind the HTTP surface.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }
}

impl Drop for TestSessionServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so the port is released when the test ends.
        self._handle.abort();
    }
}
