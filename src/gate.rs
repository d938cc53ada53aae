//! The admission gate: the public decision surface.

use std::sync::Arc;

use tracing::info;

use crate::config::{BackendKind, LimiterConfig};
use crate::engine::{MemoryLimiter, RateLimiterBackend, SharedLimiter};
use crate::error::{Result, TurnstileError};
use crate::store::AtomicStore;

/// Framework-agnostic admission control over a configured engine.
///
/// Constructed once; the backend choice is fixed at construction time and
/// invalid configuration fails fast rather than at decision time.
pub struct AdmissionGate {
    backend: Arc<dyn RateLimiterBackend>,
    /// Kept for introspection and logging
    config: LimiterConfig,
}

impl AdmissionGate {
    /// Create a gate over the in-memory engine.
    pub fn in_memory(config: LimiterConfig) -> Result<Self> {
        config.validate()?;
        let limiter = MemoryLimiter::new(config.tokens_per_interval, config.interval.duration());

        info!(
            capacity = config.tokens_per_interval,
            interval = ?config.interval,
            "Admission gate initialized with in-memory engine"
        );

        Ok(Self {
            backend: Arc::new(limiter),
            config,
        })
    }

    /// Create a gate over the shared-store engine.
    pub fn shared(config: LimiterConfig, store: Arc<dyn AtomicStore>) -> Result<Self> {
        config.validate()?;
        let limiter = SharedLimiter::new(
            store,
            config.tokens_per_interval,
            config.interval.duration(),
            config.store_timeout(),
            config.fail_policy,
        );

        info!(
            capacity = config.tokens_per_interval,
            interval = ?config.interval,
            fail_policy = ?config.fail_policy,
            "Admission gate initialized with shared-store engine"
        );

        Ok(Self {
            backend: Arc::new(limiter),
            config,
        })
    }

    /// Create a gate from configuration, selecting the engine from
    /// `config.backend`. The shared backend requires a store handle.
    pub fn from_config(config: LimiterConfig, store: Option<Arc<dyn AtomicStore>>) -> Result<Self> {
        match config.backend {
            BackendKind::Memory => Self::in_memory(config),
            BackendKind::Shared => {
                let store = store.ok_or_else(|| {
                    TurnstileError::Config(
                        "shared backend requires a store handle".to_string(),
                    )
                })?;
                Self::shared(config, store)
            }
        }
    }

    /// Decide whether one unit of work for `key` may proceed.
    ///
    /// Rejection is a normal boolean outcome; this never fails, including
    /// when the shared store is unreachable (the configured fail policy
    /// resolves that case).
    pub async fn allow(&self, key: &str) -> bool {
        self.backend.allow(key).await
    }

    /// The configuration this gate was built from.
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }
}
