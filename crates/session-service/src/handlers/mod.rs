//! HTTP request handlers for the session service.

pub mod health;
pub mod metrics;
pub mod sessions;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use sessions::{create_session, end_session, get_session, join_session, list_recordings, list_sessions};
