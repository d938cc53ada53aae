//! Axum middleware shim around the admission gate.
//!
//! This is the only piece that touches the web framework. It extracts a
//! rate-limit key from the request, asks the gate, and either continues
//! the chain or short-circuits with a 429. No bucket logic lives here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Extension, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::gate::AdmissionGate;

/// Fixed body sent with a rejection.
const REJECTION_BODY: &str = "Too Many Requests";

/// Maps an inbound request to a rate-limit key.
pub type KeyExtractor = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Extract the caller's network address as the rate-limit key.
///
/// Prefers the socket peer address, falls back to the first
/// `x-forwarded-for` entry, and finally to a fixed sentinel so requests
/// with no identifiable caller share one bucket.
pub fn client_address_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The gate plus its key extraction, shared with the middleware through a
/// request extension.
pub struct RateLimitShim {
    gate: Arc<AdmissionGate>,
    key_fn: KeyExtractor,
}

impl RateLimitShim {
    /// Create a shim keyed on the client address.
    pub fn new(gate: Arc<AdmissionGate>) -> Self {
        Self {
            gate,
            key_fn: Arc::new(client_address_key),
        }
    }

    /// Override how the rate-limit key is derived from a request.
    pub fn with_key_fn(mut self, key_fn: KeyExtractor) -> Self {
        self.key_fn = key_fn;
        self
    }
}

/// Axum middleware that enforces the admission decision.
///
/// Performs exactly one of: run the inner service, or emit a 429 with a
/// fixed textual body.
pub async fn admission_middleware(
    Extension(shim): Extension<Arc<RateLimitShim>>,
    req: Request,
    next: Next,
) -> Response {
    let key = (shim.key_fn)(&req);

    if shim.gate.allow(&key).await {
        next.run(req).await
    } else {
        debug!(key = %key, "Rejecting request");
        (StatusCode::TOO_MANY_REQUESTS, REJECTION_BODY).into_response()
    }
}
