//! Time source abstraction.
//!
//! Every time-window decision in the session lifecycle is a pure function of
//! the value returned by a [`Clock`]. Production code uses [`SystemClock`];
//! tests drive time explicitly with [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Supplies the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the host's system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Stores time with millisecond precision so it can be shared across tasks
/// without locking.
#[derive(Debug)]
pub struct ManualClock {
    now_millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.now_millis
            .store(instant.timestamp_millis(), Ordering::SeqCst);
    }

    /// Move the clock forward (or backward, for negative values) by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now_millis
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.now_millis.load(Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 15, 16, 0, 0).unwrap()
    }

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::new(t0());
        assert_eq!(clock.now(), t0());
        assert_eq!(clock.now(), t0());
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(t0());
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), t0() + Duration::seconds(90));

        clock.advance(Duration::seconds(-30));
        assert_eq!(clock.now(), t0() + Duration::seconds(60));
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::new(t0());
        let later = t0() + Duration::days(3);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        let after = Utc::now();
        assert!(now >= before && now <= after);
    }
}
