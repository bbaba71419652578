//! Deterministic clock for tests.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test infrastructure uses unwrap for simplicity

use chrono::{DateTime, Duration, Utc};
use matchday_core::environment::Clock;
use std::sync::{Arc, Mutex};

/// Fixed clock that only moves when told to.
///
/// Unlike a frozen clock, this one can be advanced mid-test, which the
/// scan session cooldown tests depend on.
///
/// # Example
///
/// ```
/// use matchday_testing::mocks::FixedClock;
/// use matchday_core::environment::Clock;
/// use chrono::{Duration, Utc};
///
/// let clock = FixedClock::new(Utc::now());
/// let before = clock.now();
/// clock.advance(Duration::seconds(3));
/// assert_eq!(clock.now(), before + Duration::seconds(3));
/// ```
#[derive(Clone, Debug)]
pub struct FixedClock {
    time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock pinned at the given time.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap();
        *time += by;
    }

    /// Pin the clock at a new time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.time.lock().unwrap() = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap()
    }
}

/// Create a default fixed clock for tests (2025-08-01 14:00:00 UTC - a
/// plausible Saturday kickoff hour).
///
/// # Panics
///
/// This function will panic if the hardcoded timestamp fails to parse,
/// which should never happen in practice.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-08-01T14:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable_until_advanced() {
        let clock = test_clock();
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a, b);

        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), a + Duration::seconds(5));
    }

    #[test]
    fn clones_share_the_same_timeline() {
        let clock = test_clock();
        let other = clock.clone();
        clock.advance(Duration::minutes(1));
        assert_eq!(clock.now(), other.now());
    }
}
