//! Issues signed session tokens to callers who pass the access gate.

use crate::config::Config;
use crate::errors::SessionError;
use crate::models::ParticipantRole;
use chrono::{DateTime, Utc};
use common::jwt::{sign_session_token, SessionTokenClaims};
use common::secret::SecretString;
use common::types::SessionId;

/// A freshly signed token and its lifetime in seconds.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u32,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Signs HS256 session tokens with the configured secret.
#[derive(Clone)]
pub struct SessionTokenIssuer {
    secret: SecretString,
    ttl_seconds: u32,
}

impl SessionTokenIssuer {
    pub fn new(secret: SecretString, ttl_seconds: u32) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session_token_secret.clone(),
            config.session_token_ttl_seconds,
        )
    }

    /// Sign a token binding `caller_id` to `session_id` with `role`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` if signing fails.
    pub fn issue(
        &self,
        caller_id: &str,
        session_id: SessionId,
        role: ParticipantRole,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, SessionError> {
        let iat = now.timestamp();
        let claims = SessionTokenClaims {
            sub: caller_id.to_string(),
            sid: session_id.to_string(),
            role: role.as_str().to_string(),
            iat,
            exp: iat + i64::from(self.ttl_seconds),
        };

        let token = sign_session_token(&claims, &self.secret).map_err(|e| {
            tracing::error!(target: "session.services.tokens", error = %e, "Failed to sign session token");
            SessionError::Internal("Failed to sign session token".to_string())
        })?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_seconds,
        })
    }
}

impl std::fmt::Debug for SessionTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}
