use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of a single check. Computed per call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    /// Attempts left in the current window.
    pub remaining: i64,
    /// Seconds until the window resets; 0 when the store reported no expiry.
    pub ttl: i64,
}

impl Decision {
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.ttl.max(0) as u64)
    }
}
