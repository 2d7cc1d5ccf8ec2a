//! Demo configuration loaded from environment variables.

use std::env;

use tally_core::{LimiterConfig, RateLimitPolicy};
use tally_infra::RedisConfig;

/// Demo configuration.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub redis: RedisConfig,
    pub limiter: LimiterConfig,
    /// Use the single-step limiter instead of read-then-decrement.
    pub strict: bool,
    /// Phone number whose logins are throttled.
    pub subject: String,
    pub attempts: u32,
    pub max_attempts: i64,
    pub window_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            limiter: LimiterConfig::default(),
            strict: false,
            subject: "9876543210".to_string(),
            attempts: 6,
            max_attempts: 5,
            window_secs: 60,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            redis: RedisConfig::from_env(),
            limiter: LimiterConfig::from_env(),
            strict: env::var("RATE_LIMIT_STRICT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.strict),
            subject: env::var("DEMO_SUBJECT").unwrap_or(defaults.subject),
            attempts: parse_or("DEMO_ATTEMPTS", defaults.attempts),
            max_attempts: parse_or("DEMO_MAX_ATTEMPTS", defaults.max_attempts),
            window_secs: parse_or("DEMO_WINDOW_SECS", defaults.window_secs),
        }
    }

    /// Login policy for the configured subject.
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            format!("{}_login", self.subject),
            self.max_attempts,
            self.window_secs,
        )
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
