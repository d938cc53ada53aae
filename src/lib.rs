//! Turnstile - Token-Bucket Admission Control
//!
//! This crate implements a per-key token bucket rate limiter with two
//! engines: in-process bucket state for a single instance, and an
//! externally shared store driven through one atomic operation for fleets
//! of instances. An [`AdmissionGate`](gate::AdmissionGate) fronts either
//! engine with a plain `allow(key) -> bool` decision, and an axum
//! middleware shim translates rejections into 429 responses.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod http;
pub mod store;
