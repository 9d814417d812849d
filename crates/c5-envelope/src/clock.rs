//! Time source used to stamp envelopes created without an explicit time.

use c5_canonical::{timestamp_from_millis, ValidationError};
use chrono::{DateTime, Utc};

/// Supplies the current instant.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Freezes the clock at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Freezes the clock at `millis` since the Unix epoch.
    pub fn from_millis(millis: i64) -> Result<Self, ValidationError> {
        Ok(Self(timestamp_from_millis(millis)?))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_never_moves() {
        let clock = FixedClock::from_millis(1_624_140_000_000).unwrap();
        assert_eq!(clock.now().timestamp_millis(), 1_624_140_000_000);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn system_clock_is_recent() {
        // 2021-01-01
        assert!(SystemClock.now().timestamp_millis() > 1_609_459_200_000);
    }
}
