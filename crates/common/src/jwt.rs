//! Signed session token utilities.
//!
//! A successful join is answered with a short-lived HS256 JWT binding the
//! caller to one session and role. This module owns the claims shape,
//! signing, and verification so that issuers and verifiers agree on it.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted on verification
//! - Expiry and `iat` are checked against a caller-supplied `now`, so
//!   verification follows the same clock as the session lifecycle
//! - Error messages are generic; details go to debug logs
//! - The `sub` field is redacted in Debug output

use crate::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Checked before any decoding so oversized input costs nothing.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Clock skew tolerance for the `iat` claim (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Minimum length of the HS256 signing secret in bytes.
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while issuing or verifying session tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionTokenError {
    /// Token size exceeds maximum allowed.
    #[error("The session token is invalid or expired")]
    TokenTooLarge,

    /// Signature, structure, or algorithm check failed.
    #[error("The session token is invalid or expired")]
    Invalid,

    /// `exp` is in the past relative to the supplied clock.
    #[error("The session token is invalid or expired")]
    Expired,

    /// `iat` is further in the future than the clock skew allows.
    #[error("The session token is invalid or expired")]
    IatTooFarInFuture,

    /// Token could not be signed.
    #[error("Session token signing failed")]
    Signing,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by a session token.
///
/// - `sub`: caller identifier (redacted in Debug output)
/// - `sid`: session identifier
/// - `role`: `host` or `participant`
/// - `iat` / `exp`: Unix epoch seconds
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Subject (caller identifier).
    pub sub: String,

    /// Session the token grants access to.
    pub sid: String,

    /// Role resolved at join time.
    pub role: String,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl fmt::Debug for SessionTokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenClaims")
            .field("sub", &"[REDACTED]")
            .field("sid", &self.sid)
            .field("role", &self.role)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

// =============================================================================
// Signing / Verification
// =============================================================================

/// Sign session token claims with HS256.
///
/// # Errors
///
/// Returns `SessionTokenError::Signing` if encoding fails.
pub fn sign_session_token(
    claims: &SessionTokenClaims,
    secret: &SecretString,
) -> Result<String, SessionTokenError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&header, claims, &key).map_err(|e| {
        tracing::error!(target: "common.jwt", error = %e, "Session token signing failed");
        SessionTokenError::Signing
    })
}

/// Verify a session token and return its claims.
///
/// `now` is Unix epoch seconds from the caller's clock. Expiry is inclusive:
/// a token is valid up to and including its `exp` second.
///
/// # Errors
///
/// - `TokenTooLarge` if the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `Invalid` on bad structure, signature, or algorithm
/// - `Expired` if `now > exp`
/// - `IatTooFarInFuture` if `iat` exceeds `now` by more than [`DEFAULT_CLOCK_SKEW`]
pub fn verify_session_token(
    token: &str,
    secret: &SecretString,
    now: i64,
) -> Result<SessionTokenClaims, SessionTokenError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum"
        );
        return Err(SessionTokenError::TokenTooLarge);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let claims = decode::<SessionTokenClaims>(token, &key, &validation)
        .map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Token rejected: decode failed");
            SessionTokenError::Invalid
        })?
        .claims;

    if now > claims.exp {
        tracing::debug!(
            target: "common.jwt",
            exp = claims.exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(SessionTokenError::Expired);
    }

    validate_iat_at(claims.iat, DEFAULT_CLOCK_SKEW, now)?;

    Ok(claims)
}

/// `iat` validation against an explicit `now` timestamp.
fn validate_iat_at(iat: i64, clock_skew: Duration, now: i64) -> Result<(), SessionTokenError> {
    // Safe cast: clock skew is a small constant
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(SessionTokenError::IatTooFarInFuture);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_900_000_000;

    fn secret() -> SecretString {
        SecretString::from("0123456789abcdef0123456789abcdef")
    }

    fn claims() -> SessionTokenClaims {
        SessionTokenClaims {
            sub: "p1".to_string(),
            sid: "00000000-0000-0000-0000-000000000001".to_string(),
            role: "participant".to_string(),
            iat: NOW,
            exp: NOW + 900,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let token = sign_session_token(&claims(), &secret()).unwrap();
        let verified = verify_session_token(&token, &secret(), NOW + 10).unwrap();
        assert_eq!(verified, claims());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = sign_session_token(&claims(), &secret()).unwrap();
        let other = SecretString::from("ffffffffffffffffffffffffffffffff");
        assert_eq!(
            verify_session_token(&token, &other, NOW),
            Err(SessionTokenError::Invalid)
        );
    }

    #[test]
    fn test_verify_expiry_is_inclusive() {
        let token = sign_session_token(&claims(), &secret()).unwrap();
        assert!(verify_session_token(&token, &secret(), NOW + 900).is_ok());
        assert_eq!(
            verify_session_token(&token, &secret(), NOW + 901),
            Err(SessionTokenError::Expired)
        );
    }

    #[test]
    fn test_verify_rejects_future_iat() {
        let mut future = claims();
        future.iat = NOW + 301;
        future.exp = NOW + 2000;
        let token = sign_session_token(&future, &secret()).unwrap();
        assert_eq!(
            verify_session_token(&token, &secret(), NOW),
            Err(SessionTokenError::IatTooFarInFuture)
        );
    }

    #[test]
    fn test_verify_rejects_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(
            verify_session_token(&token, &secret(), NOW),
            Err(SessionTokenError::TokenTooLarge)
        );
    }

    #[test]
    fn test_verify_rejects_malformed_token() {
        assert_eq!(
            verify_session_token("not.a.jwt", &secret(), NOW),
            Err(SessionTokenError::Invalid)
        );
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let mut c = claims();
        c.sub = "student-4471".to_string();
        let debug_output = format!("{c:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("student-4471"));
    }

    #[test]
    fn test_error_messages_are_generic() {
        assert_eq!(
            SessionTokenError::Expired.to_string(),
            SessionTokenError::Invalid.to_string()
        );
    }
}
