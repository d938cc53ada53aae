//! Configuration for Turnstile limiters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TurnstileError};

/// The replenishment interval for a limiter.
///
/// One full interval elapsing refills a bucket back up to its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Second,
    Minute,
    Hour,
}

impl Interval {
    /// Get the wall-clock duration of this interval.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::Second => Duration::from_secs(1),
            Interval::Minute => Duration::from_secs(60),
            Interval::Hour => Duration::from_secs(3600),
        }
    }
}

/// Which engine a gate runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single-process, in-memory bucket state
    Memory,
    /// Externally shared store, one atomic operation per decision
    Shared,
}

/// Behavior when the shared store is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailPolicy {
    /// Allow the request; a store outage must not become an outage for
    /// legitimate traffic.
    Open,
    /// Reject the request.
    Closed,
}

impl Default for FailPolicy {
    fn default() -> Self {
        FailPolicy::Open
    }
}

/// Configuration for a limiter, immutable once the gate is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Tokens granted per interval (the bucket capacity)
    pub tokens_per_interval: u64,

    /// Replenishment interval
    #[serde(default = "default_interval")]
    pub interval: Interval,

    /// Engine selection
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Fallback policy when the shared store fails
    #[serde(default)]
    pub fail_policy: FailPolicy,

    /// Upper bound on any single shared-store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

fn default_interval() -> Interval {
    Interval::Minute
}

fn default_backend() -> BackendKind {
    BackendKind::Memory
}

fn default_store_timeout_ms() -> u64 {
    1000
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            tokens_per_interval: 60,
            interval: default_interval(),
            backend: default_backend(),
            fail_policy: FailPolicy::default(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl LimiterConfig {
    /// Validate the configuration, failing fast on values that would make
    /// the limiter meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.tokens_per_interval == 0 {
            return Err(TurnstileError::Config(
                "tokens_per_interval must be greater than zero".to_string(),
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(TurnstileError::Config(
                "store_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured store timeout as a duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: LimiterConfig = serde_yaml::from_str(&contents)
            .map_err(|e| TurnstileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_duration() {
        assert_eq!(Interval::Second.duration(), Duration::from_secs(1));
        assert_eq!(Interval::Minute.duration(), Duration::from_secs(60));
        assert_eq!(Interval::Hour.duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = LimiterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fail_policy, FailPolicy::Open);
        assert_eq!(config.backend, BackendKind::Memory);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = LimiterConfig {
            tokens_per_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TurnstileError::Config(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = LimiterConfig {
            store_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
tokens_per_interval: 100
interval: second
backend: shared
fail_policy: closed
"#;
        let config: LimiterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tokens_per_interval, 100);
        assert_eq!(config.interval, Interval::Second);
        assert_eq!(config.backend, BackendKind::Shared);
        assert_eq!(config.fail_policy, FailPolicy::Closed);
        assert_eq!(config.store_timeout_ms, 1000);
    }

    #[test]
    fn test_parse_yaml_defaults() {
        let yaml = "tokens_per_interval: 10";
        let config: LimiterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.interval, Interval::Minute);
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.fail_policy, FailPolicy::Open);
    }
}
