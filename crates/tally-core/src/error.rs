//! Limiter-level error types.

use std::time::Duration;

use thiserror::Error;

use crate::ports::StoreError;

/// Failures surfaced by `check` and `enforce`.
#[derive(Debug, Error)]
pub enum LimiterError {
    /// The policy was violated. `ttl` is the number of seconds until the window resets.
    #[error("Rate limit exceeded for {identifier}, retry in {ttl}s")]
    RateLimitExceeded {
        identifier: String,
        remaining: i64,
        ttl: i64,
    },

    /// The backing store could not be reached or rejected a command.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl LimiterError {
    /// How long the caller should wait before retrying, for denials only.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { ttl, .. } => Some(Duration::from_secs((*ttl).max(0) as u64)),
            Self::StoreUnavailable(_) => None,
        }
    }
}
