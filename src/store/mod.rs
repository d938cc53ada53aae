//! Shared-store contract for the distributed engine.
//!
//! The distributed engine requires exactly one thing from its backing
//! store: an atomic check-and-consume on a single key. Any store that can
//! execute a read-decide-write for one key without interleaving concurrent
//! callers (scripted execution, conditional writes, transactions)
//! satisfies this contract.

mod redis;

pub use redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One atomic admission decision against a shared store.
#[async_trait]
pub trait AtomicStore: Send + Sync {
    /// Atomically refill the bucket for `key`, consume one token if any
    /// remain, and return whether the token was granted.
    ///
    /// The entire read-decide-write must execute as a single indivisible
    /// operation inside the store. Implementations must never issue a
    /// separate read followed by a write from the caller's process.
    async fn check_and_consume(
        &self,
        key: &str,
        capacity: u64,
        interval: Duration,
    ) -> Result<bool>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stand-ins for a shared store.

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::clock::Clock;
    use crate::engine::Bucket;
    use crate::error::{Result, TurnstileError};

    use super::AtomicStore;

    /// A faithful in-process model of the atomic store: the same
    /// refill-then-consume algorithm the Lua script runs, serialized by a
    /// single lock so two limiter instances sharing it behave like two
    /// processes sharing one store.
    pub struct InProcessStore {
        buckets: Mutex<HashMap<String, Bucket>>,
        clock: Arc<dyn Clock>,
    }

    impl InProcessStore {
        pub fn new(clock: Arc<dyn Clock>) -> Self {
            Self {
                buckets: Mutex::new(HashMap::new()),
                clock,
            }
        }
    }

    #[async_trait]
    impl AtomicStore for InProcessStore {
        async fn check_and_consume(
            &self,
            key: &str,
            capacity: u64,
            interval: Duration,
        ) -> Result<bool> {
            let now = self.clock.now();
            let mut buckets = self.buckets.lock();
            let bucket = buckets
                .entry(key.to_string())
                .or_insert_with(|| Bucket::full(capacity, now));
            bucket.refill(capacity, interval, now);
            Ok(bucket.try_consume())
        }
    }

    /// A store whose every call fails, for fail-open/fail-closed tests.
    pub struct FailingStore;

    #[async_trait]
    impl AtomicStore for FailingStore {
        async fn check_and_consume(&self, _: &str, _: u64, _: Duration) -> Result<bool> {
            Err(TurnstileError::Store(::redis::RedisError::from((
                ::redis::ErrorKind::IoError,
                "store unreachable",
            ))))
        }
    }

    /// A store that never answers, for timeout tests.
    pub struct HangingStore;

    #[async_trait]
    impl AtomicStore for HangingStore {
        async fn check_and_consume(&self, _: &str, _: u64, _: Duration) -> Result<bool> {
            std::future::pending().await
        }
    }
}
