//! Single-step fixed-window limiter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LimiterConfig;
use crate::domain::{Decision, RateLimitPolicy};
use crate::error::LimiterError;
use crate::limiter::RateLimiter;
use crate::ports::AtomicWindowStore;

/// Fixed-window limiter that decides from the store's own post-decrement
/// value.
///
/// Create, decrement and TTL read happen in one store operation, so a window
/// is opened at most once and never admits more than `max_attempts` callers,
/// however many arrive at the same time. Decisions are otherwise identical to
/// [`WindowLimiter`](super::WindowLimiter) for sequential callers.
pub struct AtomicWindowLimiter<S: ?Sized> {
    store: Arc<S>,
    config: LimiterConfig,
}

impl<S: AtomicWindowStore + ?Sized> AtomicWindowLimiter<S> {
    pub fn new(store: Arc<S>, config: LimiterConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl<S: AtomicWindowStore + ?Sized> RateLimiter for AtomicWindowLimiter<S> {
    async fn check(&self, policy: &RateLimitPolicy) -> Result<Decision, LimiterError> {
        let key = self.config.key(&policy.identifier);
        let acquired = self
            .store
            .acquire(&key, policy.initial_remaining(), policy.window_secs)
            .await?;

        if acquired.created {
            return Ok(Decision {
                allowed: true,
                remaining: acquired.value,
                ttl: policy.window_ttl(),
            });
        }

        Ok(Decision {
            allowed: acquired.value >= 0,
            remaining: acquired.value.max(0),
            ttl: acquired.ttl.as_secs(),
        })
    }
}
