//! Window limiters and the trait callers hold them by.

mod atomic;
mod window;

#[cfg(test)]
mod fake;

use async_trait::async_trait;

use crate::domain::{Decision, RateLimitPolicy};
use crate::error::LimiterError;

pub use atomic::AtomicWindowLimiter;
pub use window::WindowLimiter;

/// Rate limiter trait - abstraction over the window protocols.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one attempt against the policy and report the outcome.
    /// Store failures are returned as `StoreUnavailable`, never as a decision.
    async fn check(&self, policy: &RateLimitPolicy) -> Result<Decision, LimiterError>;

    /// Like `check`, but a denial becomes `RateLimitExceeded`.
    async fn enforce(&self, policy: &RateLimitPolicy) -> Result<(), LimiterError> {
        let decision = self.check(policy).await?;
        if decision.allowed {
            return Ok(());
        }

        Err(LimiterError::RateLimitExceeded {
            identifier: policy.identifier.clone(),
            remaining: decision.remaining,
            ttl: decision.ttl,
        })
    }
}
