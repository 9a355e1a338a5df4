//! Session Service Library
//!
//! Lifecycle management for the tutoring center's virtual sessions:
//!
//! - Scheduling sessions for a host and invited participants
//! - Gating joins on membership and the scheduled window
//! - Ending sessions and exposing their recordings
//! - Composing invitation, starting, and ended notifications
//!
//! # Architecture
//!
//! Handler -> Service -> Repository:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Session records, requests, and responses
//! - `observability` - Prometheus metrics
//! - `repositories` - Session store
//! - `routes` - Axum router setup
//! - `services` - Lifecycle manager, access gate, notifications, tokens

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
