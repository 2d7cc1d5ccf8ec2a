//! # Tally Demo
//!
//! Throttles repeated logins for one phone number: the first attempts of a
//! window go through, the rest are blocked until the window resets.

use std::sync::Arc;

use anyhow::Context;
use tally_core::ports::{AtomicWindowStore, WindowStore};
use tally_core::{AtomicWindowLimiter, LimiterError, RateLimiter, WindowLimiter};
use tally_infra::{InMemoryStore, RedisStore};

mod config;
mod telemetry;

use config::DemoConfig;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = DemoConfig::from_env();
    let limiter = build_limiter(&config).await?;
    let policy = config.policy();

    tracing::info!(
        identifier = %policy.identifier,
        max_attempts = policy.max_attempts,
        window_secs = policy.window_secs,
        strict = config.strict,
        "Testing rate limiter"
    );

    for attempt in 1..=config.attempts {
        match limiter.enforce(&policy).await {
            Ok(()) => tracing::info!(attempt, "Attempt successful"),
            Err(LimiterError::RateLimitExceeded { ttl, .. }) => {
                tracing::warn!(attempt, ttl, "Blocked! Try again in {ttl} seconds.")
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "Rate limiter unavailable");
                return Err(e).context("login attempt could not be checked");
            }
        }
    }

    Ok(())
}

async fn build_limiter(config: &DemoConfig) -> anyhow::Result<Arc<dyn RateLimiter>> {
    match RedisStore::new(&config.redis).await {
        Ok(store) => Ok(limiter_over(Arc::new(store), config)),
        Err(e) if config.redis.fallback_to_memory => {
            tracing::warn!(error = %e, "Redis unavailable, using in-memory store");
            Ok(limiter_over(Arc::new(InMemoryStore::new()), config))
        }
        Err(e) => Err(e).context("connecting to Redis"),
    }
}

fn limiter_over<S>(store: Arc<S>, config: &DemoConfig) -> Arc<dyn RateLimiter>
where
    S: WindowStore + AtomicWindowStore + 'static,
{
    if config.strict {
        Arc::new(AtomicWindowLimiter::new(store, config.limiter.clone()))
    } else {
        Arc::new(WindowLimiter::new(store, config.limiter.clone()))
    }
}
