//! Redis-backed atomic store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::trace;

use crate::error::Result;

use super::AtomicStore;

/// The whole token-bucket decision, executed server-side in one script so
/// the read-decide-write cannot interleave with other limiter instances.
///
/// State is a hash of `tokens` and `refreshed` (milliseconds, from Redis
/// `TIME` so every instance sees one clock). Refill mirrors the in-memory
/// engine: whole elapsed intervals top the bucket back up to capacity. The
/// key expires one interval after its last update, and an absent key is a
/// full bucket.
const CHECK_AND_CONSUME: &str = r#"
local key = KEYS[1]
local capacity = tonumber(ARGV[1])
local interval_ms = tonumber(ARGV[2])

local time = redis.call('TIME')
local now_ms = time[1] * 1000 + math.floor(time[2] / 1000)

local state = redis.call('HMGET', key, 'tokens', 'refreshed')
local tokens = tonumber(state[1])
local refreshed = tonumber(state[2])

if tokens == nil then
  tokens = capacity
  refreshed = now_ms
else
  local elapsed = now_ms - refreshed
  if elapsed < 0 then
    elapsed = 0
  end
  local units = math.floor(elapsed / interval_ms)
  if units > 0 then
    tokens = math.min(capacity, tokens + units * capacity)
    refreshed = now_ms
  end
end

local allowed = 0
if tokens > 0 then
  tokens = tokens - 1
  allowed = 1
end

redis.call('HSET', key, 'tokens', tokens, 'refreshed', refreshed)
redis.call('PEXPIRE', key, interval_ms)
return allowed
"#;

/// Shared bucket state in Redis, one scripted call per decision.
pub struct RedisStore {
    /// Multiplexed connection, reconnects internally
    connection: ConnectionManager,
    /// The admission script, sent by hash after first use
    script: Script,
    /// Namespace prefix for bucket keys
    prefix: String,
}

impl RedisStore {
    /// Default key namespace.
    const DEFAULT_PREFIX: &'static str = "turnstile";

    /// Connect to Redis at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self::with_connection(connection))
    }

    /// Build a store over an existing connection.
    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            script: Script::new(CHECK_AND_CONSUME),
            prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }

    /// Override the key namespace prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn bucket_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl AtomicStore for RedisStore {
    async fn check_and_consume(
        &self,
        key: &str,
        capacity: u64,
        interval: Duration,
    ) -> Result<bool> {
        let bucket_key = self.bucket_key(key);
        let mut connection = self.connection.clone();

        let allowed: i64 = self
            .script
            .key(&bucket_key)
            .arg(capacity)
            .arg(interval.as_millis() as u64)
            .invoke_async(&mut connection)
            .await?;

        trace!(key = %bucket_key, allowed = allowed, "Store decision");
        Ok(allowed == 1)
    }
}
