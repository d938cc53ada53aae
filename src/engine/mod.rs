//! Token bucket engines and state management.

mod backend;
mod bucket;
mod memory;
mod shared;

pub use backend::RateLimiterBackend;
pub use bucket::Bucket;
pub use memory::MemoryLimiter;
pub use shared::SharedLimiter;
