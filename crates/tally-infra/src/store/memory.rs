//! In-memory counter store - used as fallback when Redis is unavailable.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use tally_core::ports::{Acquired, AtomicWindowStore, StoreError, Ttl, WindowStore};

struct Counter {
    value: i64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }

    fn ttl(&self, now: Instant) -> Ttl {
        match self.expires_at {
            // Round up so a live key never reports 0.
            Some(exp) => Ttl::Expires(
                exp.saturating_duration_since(now).as_millis().div_ceil(1000) as i64,
            ),
            None => Ttl::Persistent,
        }
    }
}

/// In-memory counter store using a HashMap behind an async RwLock.
///
/// Each operation takes the lock once and releases it before returning, so
/// operations are atomic with respect to each other within this process.
/// Note: Counters are per-process, not distributed across instances, and are
/// lost on restart. Expired counters are dropped when next touched.
pub struct InMemoryStore {
    counters: RwLock<HashMap<String, Counter>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
        }
    }

    fn expiry(ttl_secs: u64) -> Result<Instant, StoreError> {
        if ttl_secs == 0 {
            return Err(StoreError::Protocol("invalid expire time".to_string()));
        }
        Ok(Instant::now() + Duration::from_secs(ttl_secs))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WindowStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let counters = self.counters.read().await;
        let Some(counter) = counters.get(key) else {
            return Ok(None);
        };

        if counter.is_expired(Instant::now()) {
            drop(counters);
            let mut counters = self.counters.write().await;
            // Re-check under the write lock; a writer may have recreated it.
            if counters
                .get(key)
                .is_some_and(|c| c.is_expired(Instant::now()))
            {
                counters.remove(key);
            }
            return Ok(counters.get(key).map(|c| c.value));
        }

        Ok(Some(counter.value))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: i64,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let expires_at = Self::expiry(ttl_secs)?;
        let mut counters = self.counters.write().await;

        counters.insert(
            key.to_string(),
            Counter {
                value,
                expires_at: Some(expires_at),
            },
        );

        Ok(())
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let mut counters = self.counters.write().await;
        let now = Instant::now();

        // Missing keys start from 0 without an expiry.
        let counter = counters
            .entry(key.to_string())
            .and_modify(|c| {
                if c.is_expired(now) {
                    *c = Counter {
                        value: 0,
                        expires_at: None,
                    };
                }
            })
            .or_insert(Counter {
                value: 0,
                expires_at: None,
            });

        counter.value -= 1;
        Ok(counter.value)
    }

    async fn ttl(&self, key: &str) -> Result<Ttl, StoreError> {
        let counters = self.counters.read().await;
        let now = Instant::now();

        Ok(match counters.get(key) {
            Some(counter) if !counter.is_expired(now) => counter.ttl(now),
            _ => Ttl::Missing,
        })
    }
}

#[async_trait]
impl AtomicWindowStore for InMemoryStore {
    async fn acquire(&self, key: &str, initial: i64, ttl_secs: u64) -> Result<Acquired, StoreError> {
        let mut counters = self.counters.write().await;
        let now = Instant::now();

        if let Some(counter) = counters.get_mut(key).filter(|c| !c.is_expired(now)) {
            counter.value -= 1;
            return Ok(Acquired {
                created: false,
                value: counter.value,
                ttl: counter.ttl(now),
            });
        }

        let expires_at = Self::expiry(ttl_secs)?;
        counters.insert(
            key.to_string(),
            Counter {
                value: initial,
                expires_at: Some(expires_at),
            },
        );
        tracing::debug!(key = %key, ttl_secs, "Window opened");

        Ok(Acquired {
            created: true,
            value: initial,
            ttl: Ttl::Expires(ttl_secs as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures::future::join_all;
    use tally_core::{
        AtomicWindowLimiter, Decision, LimiterConfig, LimiterError, RateLimitPolicy,
        RateLimiter, WindowLimiter,
    };

    #[tokio::test(start_paused = true)]
    async fn test_set_get_and_expire() {
        let store = InMemoryStore::new();
        store.set_with_expiry("k", 4, 2).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(4));
        assert_eq!(store.ttl("k").await.unwrap(), Ttl::Expires(2));

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(store.ttl("k").await.unwrap(), Ttl::Expires(1));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.ttl("k").await.unwrap(), Ttl::Missing);
    }

    #[tokio::test]
    async fn test_decrement_missing_key_has_no_expiry() {
        let store = InMemoryStore::new();

        assert_eq!(store.decrement("k").await.unwrap(), -1);
        assert_eq!(store.decrement("k").await.unwrap(), -2);
        assert_eq!(store.ttl("k").await.unwrap(), Ttl::Persistent);
    }

    #[tokio::test]
    async fn test_zero_expiry_rejected() {
        let store = InMemoryStore::new();

        let result = store.set_with_expiry("k", 1, 0).await;

        assert!(matches!(result, Err(StoreError::Protocol(_))));
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_ttl() {
        let store = Arc::new(InMemoryStore::new());
        let limiter = WindowLimiter::new(store, LimiterConfig::default());
        let policy = RateLimitPolicy::new("X", 5, 60);

        for expected in [4, 3, 2, 1, 0] {
            let decision = limiter.check(&policy).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected);
        }

        tokio::time::advance(Duration::from_secs(20)).await;
        let denied = limiter.check(&policy).await.unwrap();
        assert_eq!(
            denied,
            Decision {
                allowed: false,
                remaining: 0,
                ttl: 40
            }
        );

        let err = limiter.enforce(&policy).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(40)));

        tokio::time::advance(Duration::from_secs(40)).await;
        let fresh = limiter.check(&policy).await.unwrap();
        assert_eq!(
            fresh,
            Decision {
                allowed: true,
                remaining: 4,
                ttl: 60
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_never_exceeds_window() {
        let store = Arc::new(InMemoryStore::new());
        let limiter = AtomicWindowLimiter::new(store, LimiterConfig::default());
        let policy = RateLimitPolicy::new("X", 100, 10);

        for _ in 0..20 {
            let decision = limiter.check(&policy).await.unwrap();
            assert!(decision.ttl > 0 && decision.ttl <= 10);
            tokio::time::advance(Duration::from_millis(450)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_burst_converges_counter() {
        let store = Arc::new(InMemoryStore::new());
        let limiter = Arc::new(WindowLimiter::new(store.clone(), LimiterConfig::default()));
        let policy = RateLimitPolicy::new("burst", 10, 60);

        // Open the window first; creation itself is not guarded against races.
        assert!(limiter.check(&policy).await.unwrap().allowed);

        let handles = (0..19).map(|_| {
            let limiter = limiter.clone();
            let policy = policy.clone();
            tokio::spawn(async move { limiter.check(&policy).await })
        });
        let decisions: Vec<Decision> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let admitted = decisions.iter().filter(|d| d.allowed).count();
        assert!(admitted >= 9, "admitted {admitted}");
        assert!(decisions.iter().all(|d| d.remaining >= 0));
        assert_eq!(store.get("rate_limit:burst").await.unwrap(), Some(-10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_atomic_burst_admits_exactly_max() {
        let store = Arc::new(InMemoryStore::new());
        let limiter = Arc::new(AtomicWindowLimiter::new(
            store.clone(),
            LimiterConfig::default(),
        ));
        let policy = RateLimitPolicy::new("burst", 10, 60);

        let handles = (0..25).map(|_| {
            let limiter = limiter.clone();
            let policy = policy.clone();
            tokio::spawn(async move { limiter.enforce(&policy).await })
        });
        let results: Vec<Result<(), LimiterError>> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let admitted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(admitted, 10);
        assert!(results.iter().all(|r| match r {
            Ok(()) => true,
            Err(LimiterError::RateLimitExceeded { remaining, ttl, .. }) => {
                *remaining == 0 && *ttl > 0 && *ttl <= 60
            }
            Err(LimiterError::StoreUnavailable(_)) => false,
        }));
        assert_eq!(store.get("rate_limit:burst").await.unwrap(), Some(-15));
    }
}
