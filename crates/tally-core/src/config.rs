//! Key namespacing.

/// Default namespace for counter keys.
pub const DEFAULT_PREFIX: &str = "rate_limit";

/// Limiter configuration.
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Key prefix for counter keys.
    pub prefix: String,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl LimiterConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            prefix: std::env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
        }
    }

    /// Store key for an identifier: `prefix:identifier`.
    pub fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.prefix, identifier)
    }
}
