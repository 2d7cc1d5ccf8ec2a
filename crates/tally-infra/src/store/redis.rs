//! Redis counter store using GET/SETEX/DECR/PTTL and a Lua script for the
//! single-step path.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, Script};

use tally_core::ports::{Acquired, AtomicWindowStore, StoreError, Ttl, WindowStore};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Bound on establishing the initial connection
    pub connect_timeout: Duration,
    /// Whether callers should fall back to the in-memory store if Redis is unreachable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.fallback_to_memory),
        }
    }
}

// Returns {created, value, pttl}. `value` is 0 on create; the caller already
// holds the initial value, which is passed to SET as the raw argument string.
const ACQUIRE_SCRIPT: &str = r#"
local key = KEYS[1]

if redis.call('EXISTS', key) == 0 then
    redis.call('SET', key, ARGV[1], 'EX', ARGV[2])
    return {1, 0, redis.call('PTTL', key)}
end

local value = redis.call('DECR', key)
return {0, value, redis.call('PTTL', key)}
"#;

/// Redis-backed counter store.
///
/// Uses a connection manager for automatic reconnection. Commands are not
/// retried here; a failed command surfaces as a [`StoreError`].
pub struct RedisStore {
    conn: ConnectionManager,
    acquire: Script,
}

impl RedisStore {
    pub async fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis counter store");

        Ok(Self {
            conn,
            acquire: Script::new(ACQUIRE_SCRIPT),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(&RedisConfig::from_env()).await
    }
}

fn store_error(command: &'static str, key: &str) -> impl FnOnce(RedisError) -> StoreError {
    let key = key.to_string();
    move |e| {
        tracing::warn!(key = %key, error = %e, "Redis {command} failed");
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
        {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Protocol(e.to_string())
        }
    }
}

#[async_trait]
impl WindowStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<i64>>(key)
            .await
            .map_err(store_error("GET", key))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: i64,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(store_error("SETEX", key))
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        conn.decr::<_, _, i64>(key, 1)
            .await
            .map_err(store_error("DECR", key))
    }

    async fn ttl(&self, key: &str) -> Result<Ttl, StoreError> {
        let mut conn = self.conn.clone();
        let reply = conn
            .pttl::<_, i64>(key)
            .await
            .map_err(store_error("PTTL", key))?;
        Ok(Ttl::from_pttl_reply(reply))
    }
}

#[async_trait]
impl AtomicWindowStore for RedisStore {
    async fn acquire(&self, key: &str, initial: i64, ttl_secs: u64) -> Result<Acquired, StoreError> {
        let mut conn = self.conn.clone();

        let reply: Vec<i64> = self
            .acquire
            .key(key)
            .arg(initial)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(store_error("EVALSHA", key))?;

        let [created, value, pttl] = reply[..] else {
            return Err(StoreError::Protocol(format!(
                "unexpected acquire reply of {} elements",
                reply.len()
            )));
        };

        let created = created == 1;
        Ok(Acquired {
            created,
            value: if created { initial } else { value },
            ttl: Ttl::from_pttl_reply(pttl),
        })
    }
}
