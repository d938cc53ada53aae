//! Clock abstraction for bucket refill arithmetic.
//!
//! Engines take time from a [`Clock`] rather than reading the system clock
//! directly, so refill behavior is deterministic under test.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time, expressed as elapsed time since a fixed
/// arbitrary epoch.
///
/// Implementations must be thread-safe. Readings are expected to be
/// non-decreasing, but engines clamp a backwards step rather than relying
/// on it.
pub trait Clock: Send + Sync {
    /// The current time as an offset from the clock's epoch.
    fn now(&self) -> Duration;
}

/// Wall-clock time relative to the Unix epoch.
///
/// A system clock reading before the epoch clamps to zero.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

/// A hand-driven clock for tests.
#[cfg(test)]
pub struct ManualClock {
    now: parking_lot::Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self {
            now: parking_lot::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
