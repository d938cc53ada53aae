//! Token bucket state.

use std::time::Duration;

/// Per-key bucket state: remaining tokens and the time of the last refill.
///
/// Invariant: `tokens <= capacity` at every observable point, and
/// `last_refill` never decreases across updates to the same bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Remaining tokens
    tokens: u64,
    /// Clock reading at the last top-up
    last_refill: Duration,
}

impl Bucket {
    /// Create a full bucket, as observed on first sight of a key.
    pub fn full(capacity: u64, now: Duration) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Top up the bucket for whole intervals elapsed since the last refill.
    ///
    /// Refill happens in discrete interval-sized jumps rather than
    /// continuous leakage; callers needing leak semantics should use a
    /// different algorithm. A clock reading earlier than `last_refill`
    /// counts as zero elapsed time.
    pub fn refill(&mut self, capacity: u64, interval: Duration, now: Duration) {
        let elapsed = now.saturating_sub(self.last_refill);
        let units = (elapsed.as_nanos() / interval.as_nanos().max(1)) as u64;
        if units > 0 {
            self.tokens = capacity.min(self.tokens.saturating_add(units.saturating_mul(capacity)));
            self.last_refill = now;
        }
    }

    /// Consume one token if any remain. Returns whether a token was spent.
    pub fn try_consume(&mut self) -> bool {
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Remaining tokens.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Clock reading at the last top-up.
    pub fn last_refill(&self) -> Duration {
        self.last_refill
    }
}
