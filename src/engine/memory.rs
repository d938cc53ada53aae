//! In-memory token bucket engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};

use super::backend::RateLimiterBackend;
use super::bucket::Bucket;

/// Single-process token bucket engine.
///
/// Buckets are created lazily per key and live for the lifetime of the
/// limiter. The map is exclusively owned by this instance; there is no
/// process-wide singleton. The lookup-refill-decrement sequence for a key
/// runs entirely under the map entry's guard, so concurrent callers racing
/// on the same key cannot both spend the last token.
pub struct MemoryLimiter {
    /// Bucket state indexed by client key
    buckets: DashMap<String, Bucket>,
    /// Bucket capacity (tokens per interval)
    capacity: u64,
    /// Replenishment interval
    interval: Duration,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl MemoryLimiter {
    /// Create a new in-memory limiter on the system clock.
    pub fn new(capacity: u64, interval: Duration) -> Self {
        Self::with_clock(capacity, interval, Arc::new(SystemClock))
    }

    /// Create a new in-memory limiter with an explicit time source.
    pub fn with_clock(capacity: u64, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity,
            interval,
            clock,
        }
    }

    /// Decide whether one unit of work for `key` may proceed, consuming a
    /// token when it does.
    ///
    /// Non-blocking and safe to call concurrently. A capacity of zero
    /// rejects everything.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();

        // The entry guard holds the shard lock for the whole
        // lookup-refill-decrement sequence.
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(key = %key, capacity = self.capacity, "Creating new bucket");
                Bucket::full(self.capacity, now)
            });

        bucket.refill(self.capacity, self.interval, now);
        let allowed = bucket.try_consume();

        trace!(
            key = %key,
            allowed = allowed,
            remaining = bucket.tokens(),
            "Admission decision"
        );
        if !allowed {
            debug!(key = %key, "Rate limit exceeded");
        }

        allowed
    }

    /// Remaining tokens for a key, or `None` if the key has not been seen.
    pub fn remaining(&self, key: &str) -> Option<u64> {
        self.buckets.get(key).map(|b| b.tokens())
    }

    /// Number of tracked keys.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drop all bucket state. Primarily useful for testing.
    pub fn clear(&self) {
        self.buckets.clear();
    }
}

#[async_trait]
impl RateLimiterBackend for MemoryLimiter {
    async fn allow(&self, key: &str) -> bool {
        MemoryLimiter::allow(self, key)
    }
}
