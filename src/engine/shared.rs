//! Shared-store token bucket engine.
//!
//! Each decision is one atomic operation against an external store, so
//! independent limiter processes with no shared memory agree on a single
//! linear order of grants per key. Nothing here reads then writes the
//! store separately; any state observed outside the atomic call would
//! already be stale by the time a write landed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::FailPolicy;
use crate::error::TurnstileError;
use crate::store::AtomicStore;

use super::backend::RateLimiterBackend;

/// Token bucket engine over an externally shared store.
///
/// The store is the single source of truth; this instance holds no
/// authoritative bucket state of its own.
pub struct SharedLimiter {
    /// The shared store, mutated only through its atomic operation
    store: Arc<dyn AtomicStore>,
    /// Bucket capacity (tokens per interval)
    capacity: u64,
    /// Replenishment interval, also the store entry TTL
    interval: Duration,
    /// Bound on any single store call
    timeout: Duration,
    /// Behavior when the store is unreachable
    fail_policy: FailPolicy,
}

impl SharedLimiter {
    /// Create a new shared-store limiter.
    pub fn new(
        store: Arc<dyn AtomicStore>,
        capacity: u64,
        interval: Duration,
        timeout: Duration,
        fail_policy: FailPolicy,
    ) -> Self {
        Self {
            store,
            capacity,
            interval,
            timeout,
            fail_policy,
        }
    }

    /// Decide whether one unit of work for `key` may proceed.
    ///
    /// A store error or timeout is resolved by the configured fail policy
    /// and surfaced as a warning; it is never returned to the caller.
    pub async fn allow(&self, key: &str) -> bool {
        let call = self.store.check_and_consume(key, self.capacity, self.interval);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(allowed)) => allowed,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Shared store call failed, applying fail policy");
                self.fallback()
            }
            Err(_) => {
                let e = TurnstileError::StoreTimeout(self.timeout);
                warn!(key = %key, error = %e, "Shared store call failed, applying fail policy");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> bool {
        match self.fail_policy {
            FailPolicy::Open => true,
            FailPolicy::Closed => false,
        }
    }
}

#[async_trait]
impl RateLimiterBackend for SharedLimiter {
    async fn allow(&self, key: &str) -> bool {
        SharedLimiter::allow(self, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::store::testing::{FailingStore, HangingStore, InProcessStore};

    const INTERVAL: Duration = Duration::from_secs(1);
    const TIMEOUT: Duration = Duration::from_millis(50);

    fn shared_limiter(store: Arc<dyn AtomicStore>, capacity: u64) -> SharedLimiter {
        SharedLimiter::new(store, capacity, INTERVAL, TIMEOUT, FailPolicy::Open)
    }

    #[tokio::test]
    async fn test_exhaustion_and_refill() {
        let clock = Arc::new(ManualClock::new(Duration::ZERO));
        let store = Arc::new(InProcessStore::new(clock.clone() as Arc<dyn Clock>));
        let limiter = shared_limiter(store, 2);

        assert!(limiter.allow("client").await);
        assert!(limiter.allow("client").await);
        assert!(!limiter.allow("client").await);

        clock.advance(INTERVAL);
        assert!(limiter.allow("client").await);
    }

    #[tokio::test]
    async fn test_two_instances_share_one_budget() {
        // Two limiter instances over one store model two processes; the
        // allowed sum for a key within one interval stays within capacity.
        let clock = Arc::new(ManualClock::new(Duration::ZERO));
        let store: Arc<dyn AtomicStore> =
            Arc::new(InProcessStore::new(clock.clone() as Arc<dyn Clock>));
        let a = shared_limiter(store.clone(), 5);
        let b = shared_limiter(store.clone(), 5);

        let mut allowed = 0;
        for _ in 0..4 {
            if a.allow("tenant").await {
                allowed += 1;
            }
            if b.allow("tenant").await {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 5);
    }

    #[tokio::test]
    async fn test_concurrent_callers_never_exceed_capacity() {
        const CAPACITY: u64 = 8;
        const CALLERS: usize = 24;

        let clock = Arc::new(ManualClock::new(Duration::ZERO));
        let store: Arc<dyn AtomicStore> =
            Arc::new(InProcessStore::new(clock as Arc<dyn Clock>));
        let limiter = Arc::new(shared_limiter(store, CAPACITY));

        let calls = (0..CALLERS).map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.allow("contended").await })
        });

        let results = futures::future::join_all(calls).await;
        let allowed = results
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();

        assert_eq!(allowed as u64, CAPACITY);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let clock = Arc::new(ManualClock::new(Duration::ZERO));
        let store = Arc::new(InProcessStore::new(clock as Arc<dyn Clock>));
        let limiter = shared_limiter(store, 1);

        assert!(limiter.allow("a").await);
        assert!(!limiter.allow("a").await);
        assert!(limiter.allow("b").await);
    }

    #[tokio::test]
    async fn test_store_failure_fail_open() {
        let limiter = SharedLimiter::new(
            Arc::new(FailingStore),
            2,
            INTERVAL,
            TIMEOUT,
            FailPolicy::Open,
        );
        assert!(limiter.allow("client").await);
    }

    #[tokio::test]
    async fn test_store_failure_fail_closed() {
        let limiter = SharedLimiter::new(
            Arc::new(FailingStore),
            2,
            INTERVAL,
            TIMEOUT,
            FailPolicy::Closed,
        );
        assert!(!limiter.allow("client").await);
    }

    #[tokio::test]
    async fn test_store_timeout_applies_fail_policy() {
        let open = SharedLimiter::new(
            Arc::new(HangingStore),
            2,
            INTERVAL,
            TIMEOUT,
            FailPolicy::Open,
        );
        assert!(open.allow("client").await);

        let closed = SharedLimiter::new(
            Arc::new(HangingStore),
            2,
            INTERVAL,
            TIMEOUT,
            FailPolicy::Closed,
        );
        assert!(!closed.allow("client").await);
    }
}
