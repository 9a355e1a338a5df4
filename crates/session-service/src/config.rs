//! Session service configuration.
//!
//! Configuration is loaded from environment variables. Sensitive fields are
//! redacted in Debug output.

use common::jwt::MIN_SIGNING_SECRET_BYTES;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default base for session join links.
pub const DEFAULT_JOIN_BASE_URL: &str = "http://localhost:3000/sessions";

/// Default base for recording links.
pub const DEFAULT_RECORDING_BASE_URL: &str = "http://localhost:3000/recordings";

/// Default scheduled length of a session in minutes.
pub const DEFAULT_SESSION_MINUTES: i64 = 60;

/// Maximum default session length in minutes (one day).
pub const MAX_SESSION_MINUTES: i64 = 1440;

/// Default recording availability window in days.
pub const DEFAULT_RECORDING_RETENTION_DAYS: i64 = 30;

/// Maximum recording availability window in days (ten years).
pub const MAX_RECORDING_RETENTION_DAYS: i64 = 3650;

/// Default session token TTL in seconds (15 minutes).
pub const DEFAULT_SESSION_TOKEN_TTL_SECONDS: u32 = 900;

/// Maximum session token TTL in seconds (1 hour).
pub const MAX_SESSION_TOKEN_TTL_SECONDS: u32 = 3600;

/// Session service configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// HS256 key for session tokens.
    /// Protected by `SecretString` to prevent accidental logging.
    pub session_token_secret: SecretString,

    /// Base URL for join links; the session id is appended.
    pub join_base_url: String,

    /// Base URL for recording links; the session id is appended.
    pub recording_base_url: String,

    /// Scheduled length applied when a request omits `scheduledEnd`.
    pub default_session_minutes: i64,

    /// How long a recording stays available after it is listed.
    pub recording_retention_days: i64,

    /// Lifetime of tokens issued on join.
    pub session_token_ttl_seconds: u32,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("session_token_secret", &"[REDACTED]")
            .field("join_base_url", &self.join_base_url)
            .field("recording_base_url", &self.recording_base_url)
            .field("default_session_minutes", &self.default_session_minutes)
            .field("recording_retention_days", &self.recording_retention_days)
            .field("session_token_ttl_seconds", &self.session_token_ttl_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid session token secret: {0}")]
    InvalidTokenSecret(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let session_token_secret = SecretString::from(
            vars.get("SESSION_TOKEN_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("SESSION_TOKEN_SECRET".to_string()))?
                .clone(),
        );

        if session_token_secret.expose_secret().len() < MIN_SIGNING_SECRET_BYTES {
            return Err(ConfigError::InvalidTokenSecret(format!(
                "SESSION_TOKEN_SECRET must be at least {} bytes",
                MIN_SIGNING_SECRET_BYTES
            )));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let join_base_url = vars
            .get("JOIN_BASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_JOIN_BASE_URL.to_string());

        let recording_base_url = vars
            .get("RECORDING_BASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RECORDING_BASE_URL.to_string());

        let default_session_minutes = parse_in_range(
            vars,
            "DEFAULT_SESSION_MINUTES",
            DEFAULT_SESSION_MINUTES,
            MAX_SESSION_MINUTES,
        )?;

        let recording_retention_days = parse_in_range(
            vars,
            "RECORDING_RETENTION_DAYS",
            DEFAULT_RECORDING_RETENTION_DAYS,
            MAX_RECORDING_RETENTION_DAYS,
        )?;

        let session_token_ttl_seconds =
            if let Some(value_str) = vars.get("SESSION_TOKEN_TTL_SECONDS") {
                let value: u32 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidValue(format!(
                        "SESSION_TOKEN_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 || value > MAX_SESSION_TOKEN_TTL_SECONDS {
                    return Err(ConfigError::InvalidValue(format!(
                        "SESSION_TOKEN_TTL_SECONDS must be between 1 and {}, got {}",
                        MAX_SESSION_TOKEN_TTL_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_SESSION_TOKEN_TTL_SECONDS
            };

        Ok(Config {
            bind_address,
            session_token_secret,
            join_base_url,
            recording_base_url,
            default_session_minutes,
            recording_retention_days,
            session_token_ttl_seconds,
        })
    }
}

/// Parse an optional integer variable constrained to `1..=max`.
fn parse_in_range(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
    max: i64,
) -> Result<i64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: i64 = value_str.parse().map_err(|e| {
        ConfigError::InvalidValue(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value <= 0 || value > max {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {}, got {}",
            name, max, value
        )));
    }

    Ok(value)
}
