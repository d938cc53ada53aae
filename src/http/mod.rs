//! HTTP adapter for the admission gate.

mod middleware;

pub use middleware::{admission_middleware, client_address_key, KeyExtractor, RateLimitShim};
