//! Metrics definitions for the session service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `session_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: ~8 values (parameterized paths)
//! - `status`: 3 values for HTTP (success, error, timeout)
//! - `operation`: create, join, end, list_recordings
//! - `reason`: one value per access gate rule
//! - `kind`: one value per notification kind

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("session_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Lifecycle operations are in-memory; sub-millisecond resolution matters
        .set_buckets_for_metric(
            Matcher::Prefix("session_lifecycle_operation".to_string()),
            &[
                0.0001, 0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set lifecycle operation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `session_http_requests_total`, `session_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level rejections (404, 405, 415) as well as handler
/// responses.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("session_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("session_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" => "/".to_string(),
        "/health" => "/health".to_string(),
        "/ready" => "/ready".to_string(),
        "/metrics" => "/metrics".to_string(),
        "/api/v1/sessions" => "/api/v1/sessions".to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Replace session ids with a placeholder.
fn normalize_dynamic_endpoint(path: &str) -> String {
    if path.starts_with("/api/v1/sessions/") {
        let parts: Vec<&str> = path.split('/').collect();

        // /api/v1/sessions/{id} -> parts.len() == 5
        if parts.len() == 5 {
            return "/api/v1/sessions/{id}".to_string();
        }

        // /api/v1/sessions/{id}/{action} -> parts.len() == 6
        if parts.len() == 6 {
            if let Some(action) = parts.get(5) {
                match *action {
                    "join" => return "/api/v1/sessions/{id}/join".to_string(),
                    "end" => return "/api/v1/sessions/{id}/end".to_string(),
                    "recordings" => return "/api/v1/sessions/{id}/recordings".to_string(),
                    _ => {}
                }
            }
        }
    }

    "/other".to_string()
}

// ============================================================================
// Lifecycle Metrics
// ============================================================================

/// Record a lifecycle operation and its outcome.
///
/// Metric: `session_lifecycle_operations_total`, `session_lifecycle_operation_duration_seconds`
/// Labels: `operation`, `status`
///
/// Status is "success" or the error kind (`not_found`, `access_denied`, ...).
pub fn record_lifecycle_operation(operation: &str, status: &str, duration: Duration) {
    histogram!("session_lifecycle_operation_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("session_lifecycle_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an access gate denial.
///
/// Metric: `session_access_denials_total`
/// Labels: `reason`
pub fn record_access_denial(reason: &str) {
    counter!("session_access_denials_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record one composed notification.
///
/// Metric: `session_notifications_total`
/// Labels: `kind`
pub fn record_notification(kind: &str) {
    counter!("session_notifications_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // These run against the global no-op recorder; they exercise the code
    // paths without asserting on recorded values.

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(5));
        record_http_request("POST", "/api/v1/sessions", 201, Duration::from_millis(12));
        record_http_request(
            "POST",
            "/api/v1/sessions/550e8400-e29b-41d4-a716-446655440000/join",
            403,
            Duration::from_millis(3),
        );
        record_http_request("GET", "/api/v1/sessions", 504, Duration::from_secs(30));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(201), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(400), "error");
        assert_eq!(categorize_status_code(403), "error");
        assert_eq!(categorize_status_code(404), "error");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/"), "/");
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/ready"), "/ready");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/v1/sessions"), "/api/v1/sessions");
    }

    #[test]
    fn test_normalize_endpoint_session_paths() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(
            normalize_endpoint(&format!("/api/v1/sessions/{id}")),
            "/api/v1/sessions/{id}"
        );
        assert_eq!(
            normalize_endpoint(&format!("/api/v1/sessions/{id}/join")),
            "/api/v1/sessions/{id}/join"
        );
        assert_eq!(
            normalize_endpoint(&format!("/api/v1/sessions/{id}/end")),
            "/api/v1/sessions/{id}/end"
        );
        assert_eq!(
            normalize_endpoint(&format!("/api/v1/sessions/{id}/recordings")),
            "/api/v1/sessions/{id}/recordings"
        );
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/unknown"), "/other");
        assert_eq!(normalize_endpoint("/api/v2/sessions"), "/other");
        assert_eq!(normalize_endpoint("/api/v1/sessions/x/unknown"), "/other");
        assert_eq!(normalize_endpoint("/api/v1/sessions/x/join/extra"), "/other");
    }

    #[test]
    fn test_record_lifecycle_operation() {
        record_lifecycle_operation("create", "success", Duration::from_micros(80));
        record_lifecycle_operation("join", "access_denied", Duration::from_micros(40));
        record_lifecycle_operation("end", "not_found", Duration::from_micros(20));
        record_lifecycle_operation("list_recordings", "success", Duration::from_micros(30));
    }

    #[test]
    fn test_record_access_denial_and_notification() {
        record_access_denial("session_ended");
        record_access_denial("not_invited");
        record_notification("session_invitation");
        record_notification("session_ended");
    }

    #[test]
    fn test_lifecycle_metrics_are_recorded_by_name() {
        use metrics_util::debugging::DebuggingRecorder;

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_lifecycle_operation("join", "access_denied", Duration::from_micros(40));
            record_access_denial("not_started");
            record_notification("session_starting");
        });

        let names: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, _)| key.key().name().to_string())
            .collect();

        for expected in [
            "session_lifecycle_operations_total",
            "session_lifecycle_operation_duration_seconds",
            "session_access_denials_total",
            "session_notifications_total",
        ] {
            assert!(
                names.iter().any(|n| n == expected),
                "missing {expected} in {names:?}"
            );
        }
    }
}
