//! Rate limiter trait for abstracting the in-memory and shared-store engines.

use async_trait::async_trait;

/// Trait for rate limiter engine implementations.
///
/// This trait abstracts over both the in-memory [`MemoryLimiter`] and the
/// [`SharedLimiter`] so the admission gate can work with either.
///
/// [`MemoryLimiter`]: super::MemoryLimiter
/// [`SharedLimiter`]: super::SharedLimiter
#[async_trait]
pub trait RateLimiterBackend: Send + Sync {
    /// Decide whether one unit of work for `key` may proceed.
    ///
    /// Rejection is a normal boolean outcome, never an error.
    async fn allow(&self, key: &str) -> bool;
}
