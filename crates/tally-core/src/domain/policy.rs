use serde::{Deserialize, Serialize};

/// "N attempts per T seconds" for one identifier.
///
/// Supplied fresh on every call; nothing retains it. `max_attempts` is signed
/// and not validated: a non-positive value still admits the first attempt of
/// a window and shows up as a negative `remaining`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub identifier: String,
    pub max_attempts: i64,
    pub window_secs: u64,
}

impl RateLimitPolicy {
    pub fn new(identifier: impl Into<String>, max_attempts: i64, window_secs: u64) -> Self {
        Self {
            identifier: identifier.into(),
            max_attempts,
            window_secs,
        }
    }

    /// Counter value written when a window is created.
    pub(crate) fn initial_remaining(&self) -> i64 {
        self.max_attempts.saturating_sub(1)
    }

    pub(crate) fn window_ttl(&self) -> i64 {
        i64::try_from(self.window_secs).unwrap_or(i64::MAX)
    }
}
