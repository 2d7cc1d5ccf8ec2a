//! Counter store port.

use async_trait::async_trait;

/// Key-value store with the atomic primitives the window protocol needs.
///
/// Every operation must be atomic with respect to concurrent callers in any
/// process. Timeouts and reconnection belong to the implementation; a failed
/// call is reported once and never retried by the limiter.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Current counter value, or `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    /// Unconditionally set `key` to `value`, expiring after `ttl_secs`.
    async fn set_with_expiry(&self, key: &str, value: i64, ttl_secs: u64)
    -> Result<(), StoreError>;

    /// Atomically decrement `key` by one and return the new value.
    async fn decrement(&self, key: &str) -> Result<i64, StoreError>;

    /// Remaining time-to-live of `key`.
    async fn ttl(&self, key: &str) -> Result<Ttl, StoreError>;
}

/// Stores that can create-or-decrement a counter and read its TTL in one
/// atomic step.
#[async_trait]
pub trait AtomicWindowStore: Send + Sync {
    /// If `key` is absent, set it to `initial` with a `ttl_secs` expiry.
    /// Otherwise decrement it. The TTL is read in the same step.
    async fn acquire(&self, key: &str, initial: i64, ttl_secs: u64)
    -> Result<Acquired, StoreError>;
}

/// Result of [`AtomicWindowStore::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    /// Whether this call opened the window.
    pub created: bool,
    /// Counter value after this call's create or decrement.
    pub value: i64,
    pub ttl: Ttl,
}

/// Time-to-live as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key expires in this many seconds.
    Expires(i64),
    /// Key exists without an expiry.
    Persistent,
    /// Key does not exist.
    Missing,
}

impl Ttl {
    /// Map a Redis-style PTTL reply (`-2` missing, `-1` no expiry,
    /// otherwise milliseconds). Rounds up so a live key never reports 0.
    pub fn from_pttl_reply(reply: i64) -> Self {
        match reply {
            -2 => Self::Missing,
            r if r < 0 => Self::Persistent,
            millis => Self::Expires((millis.saturating_add(999) / 1000).max(1)),
        }
    }

    /// Seconds until expiry, 0 when there is none to report.
    pub fn as_secs(self) -> i64 {
        match self {
            Self::Expires(secs) => secs,
            Self::Persistent | Self::Missing => 0,
        }
    }
}

/// Store operation errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}
