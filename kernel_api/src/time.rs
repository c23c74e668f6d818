//! Time abstractions
//!
//! Time is counted in scheduler ticks, the unit the kernel actually
//! advances. The nominal tick rate is [`TICKS_PER_SECOND`]; the helpers
//! convert from wall-clock units at that rate.

use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// Nominal scheduler tick rate (one tick per millisecond).
pub const TICKS_PER_SECOND: u64 = 1_000;

/// A point in virtual time.
///
/// Opaque tick count since kernel start. In the simulated kernel time only
/// moves when a test advances it, which keeps every wait deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instant {
    ticks: u64,
}

impl Instant {
    /// Creates an instant from a tick count
    pub const fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    /// Returns the tick count
    pub const fn as_ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the duration since an earlier instant
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_ticks(self.ticks.saturating_sub(earlier.ticks))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Self::Output {
        Instant::from_ticks(self.ticks + duration.as_ticks())
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, duration: Duration) -> Self::Output {
        Instant::from_ticks(self.ticks.saturating_sub(duration.as_ticks()))
    }
}

/// A span of virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    ticks: u64,
}

impl Duration {
    /// Creates a duration from scheduler ticks
    pub const fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    /// Creates a duration from milliseconds at the nominal tick rate
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            ticks: millis * TICKS_PER_SECOND / 1_000,
        }
    }

    /// Creates a duration from seconds at the nominal tick rate
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            ticks: secs * TICKS_PER_SECOND,
        }
    }

    /// Returns the duration in ticks
    pub const fn as_ticks(&self) -> u64 {
        self.ticks
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Self::Output {
        Duration::from_ticks(self.ticks + other.ticks)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Self::Output {
        Duration::from_ticks(self.ticks.saturating_sub(other.ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_conversions() {
        assert_eq!(Duration::from_secs(1), Duration::from_millis(1000));
        assert_eq!(Duration::from_millis(1).as_ticks(), 1);
        assert_eq!(Duration::from_secs(2).as_ticks(), 2 * TICKS_PER_SECOND);
    }

    #[test]
    fn test_duration_arithmetic() {
        let a = Duration::from_ticks(500);
        let b = Duration::from_ticks(300);
        assert_eq!(a + b, Duration::from_ticks(800));
        assert_eq!(a - b, Duration::from_ticks(200));
        assert_eq!(b - a, Duration::from_ticks(0));
    }

    #[test]
    fn test_instant_arithmetic() {
        let start = Instant::from_ticks(100);
        let later = start + Duration::from_ticks(50);
        assert_eq!(later.as_ticks(), 150);
        assert_eq!(later.duration_since(start), Duration::from_ticks(50));
        assert_eq!(start.duration_since(later), Duration::from_ticks(0));
        assert_eq!(later - Duration::from_ticks(150), Instant::from_ticks(0));
    }
}
