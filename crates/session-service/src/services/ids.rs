//! Identifier generation and derived session fields.
//!
//! Session ids and access secrets come from the ring CSPRNG. Join and
//! recording links are pure string derivations from a configured base and
//! the session id, so the same inputs always give the same link.

use crate::errors::SessionError;
use chrono::{DateTime, Utc};
use common::types::SessionId;
use ring::rand::{SecureRandom, SystemRandom};
use uuid::Uuid;

/// Length of generated access secrets in bytes (256 bits).
const ACCESS_SECRET_BYTES: usize = 32;

/// Source of unique identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new unique identifier.
    fn generate(&self) -> Result<Uuid, SessionError>;
}

/// Random v4 UUIDs from the system CSPRNG.
#[derive(Debug)]
pub struct CsprngIdGenerator {
    rng: SystemRandom,
}

impl CsprngIdGenerator {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for CsprngIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for CsprngIdGenerator {
    fn generate(&self) -> Result<Uuid, SessionError> {
        let mut bytes = [0u8; 16];

        self.rng.fill(&mut bytes).map_err(|e| {
            tracing::error!(target: "session.services.ids", error = %e, "Failed to generate random bytes");
            SessionError::Internal(format!("RNG failure: {}", e))
        })?;

        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

/// Generate a random access secret.
///
/// Produces 32 random bytes hex-encoded to 64 characters.
pub fn generate_access_secret() -> Result<String, SessionError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; ACCESS_SECRET_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!(target: "session.services.ids", error = %e, "Failed to generate random bytes for access secret");
        SessionError::Internal("RNG failure".to_string())
    })?;

    Ok(hex::encode(bytes))
}

/// Join link for a session.
pub fn join_url_for(base: &str, id: SessionId) -> String {
    format!("{}/{}", base.trim_end_matches('/'), id)
}

/// Recording link for a session. Stable for a given base and id.
pub fn recording_url_for(base: &str, id: SessionId) -> String {
    format!("{}/{}/recording.mp4", base.trim_end_matches('/'), id)
}

/// Whole minutes between two instants, rounded half away from zero.
///
/// `None` when either side is missing.
pub fn duration_minutes(
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
) -> Option<i64> {
    let (start, end) = (actual_start?, actual_end?);
    let millis = (end - start).num_milliseconds();
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let minutes = (millis as f64 / 60_000.0).round() as i64;
    Some(minutes)
}

/// Deterministic id generators for tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Hands out `00000000-0000-0000-0000-000000000001`, `...0002`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of ids handed out so far.
        pub fn issued(&self) -> u64 {
            self.next.load(Ordering::SeqCst)
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn generate(&self) -> Result<Uuid, SessionError> {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Uuid::from_u128(u128::from(n)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::mock::SequentialIdGenerator;
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_csprng_ids_are_v4_and_unique() {
        let ids = CsprngIdGenerator::new();
        let a = ids.generate().unwrap();
        let b = ids.generate().unwrap();
        assert_eq!(a.get_version_num(), 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.generate().unwrap(), Uuid::from_u128(1));
        assert_eq!(ids.generate().unwrap(), Uuid::from_u128(2));
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_generate_access_secret_format() {
        let secret = generate_access_secret().unwrap();
        assert_eq!(secret.len(), 64, "Access secret must be 64 hex chars");
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_access_secret_uniqueness() {
        assert_ne!(
            generate_access_secret().unwrap(),
            generate_access_secret().unwrap()
        );
    }

    #[test]
    fn test_recording_url_is_deterministic() {
        let id = SessionId(Uuid::from_u128(42));
        let a = recording_url_for("https://media.example.org/rec/", id);
        let b = recording_url_for("https://media.example.org/rec", id);
        assert_eq!(a, b);
        assert_eq!(
            a,
            "https://media.example.org/rec/00000000-0000-0000-0000-00000000002a/recording.mp4"
        );
    }

    #[test]
    fn test_join_url() {
        let id = SessionId(Uuid::from_u128(1));
        assert_eq!(
            join_url_for("https://tutoring.example.org/join/", id),
            "https://tutoring.example.org/join/00000000-0000-0000-0000-000000000001"
        );
    }

    #[test]
    fn test_duration_minutes_rounds() {
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(
            duration_minutes(Some(start), Some(start + Duration::seconds(89))),
            Some(1)
        );
        assert_eq!(
            duration_minutes(Some(start), Some(start + Duration::seconds(90))),
            Some(2)
        );
        assert_eq!(
            duration_minutes(Some(start), Some(start + Duration::minutes(45))),
            Some(45)
        );
    }

    #[test]
    fn test_duration_minutes_missing_side() {
        let t = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(duration_minutes(None, Some(t)), None);
        assert_eq!(duration_minutes(Some(t), None), None);
        assert_eq!(duration_minutes(None, None), None);
    }
}
