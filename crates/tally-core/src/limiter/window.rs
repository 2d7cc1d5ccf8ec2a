//! Read-then-decrement fixed-window limiter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LimiterConfig;
use crate::domain::{Decision, RateLimitPolicy};
use crate::error::LimiterError;
use crate::limiter::RateLimiter;
use crate::ports::WindowStore;

/// Fixed-window limiter over a [`WindowStore`].
///
/// The first check of a window writes `max_attempts - 1` with the window as
/// expiry. Later checks decide from the value read *before* their own
/// decrement, while the decrement itself is what the store keeps. Concurrent
/// callers can therefore all read a permitting value and be admitted together
/// at the window boundary; the stored counter still converges to the exact
/// count. [`AtomicWindowLimiter`](super::AtomicWindowLimiter) closes that gap.
pub struct WindowLimiter<S: ?Sized> {
    store: Arc<S>,
    config: LimiterConfig,
}

impl<S: WindowStore + ?Sized> WindowLimiter<S> {
    pub fn new(store: Arc<S>, config: LimiterConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl<S: WindowStore + ?Sized> RateLimiter for WindowLimiter<S> {
    async fn check(&self, policy: &RateLimitPolicy) -> Result<Decision, LimiterError> {
        let key = self.config.key(&policy.identifier);

        let Some(current) = self.store.get(&key).await? else {
            let remaining = policy.initial_remaining();
            self.store
                .set_with_expiry(&key, remaining, policy.window_secs)
                .await?;

            return Ok(Decision {
                allowed: true,
                remaining,
                ttl: policy.window_ttl(),
            });
        };

        let remaining = current.saturating_sub(1);
        self.store.decrement(&key).await?;
        let ttl = self.store.ttl(&key).await?;

        Ok(Decision {
            allowed: remaining >= 0,
            remaining: remaining.max(0),
            ttl: ttl.as_secs(),
        })
    }
}
