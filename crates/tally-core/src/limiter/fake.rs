//! Scripted store for limiter tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{Acquired, AtomicWindowStore, StoreError, Ttl, WindowStore};

struct Entry {
    value: i64,
    ttl: Ttl,
}

/// Map-backed store. Time does not pass; expiry is triggered by hand.
#[derive(Default)]
pub struct FakeStore {
    entries: Mutex<HashMap<String, Entry>>,
    calls: Mutex<Vec<&'static str>>,
    down: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with a connection error.
    pub fn unreachable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    pub fn value(&self, key: &str) -> Option<i64> {
        self.entries.lock().unwrap().get(key).map(|e| e.value)
    }

    pub fn expire(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn set_ttl(&self, key: &str, ttl: Ttl) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.ttl = ttl;
        }
    }

    /// Operations issued so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(op);
        if self.down {
            return Err(StoreError::Connection("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WindowStore for FakeStore {
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        self.record("get")?;
        Ok(self.value(key))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: i64,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.record("set_with_expiry")?;
        self.entries.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value,
                ttl: Ttl::Expires(ttl_secs as i64),
            },
        );
        Ok(())
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        self.record("decrement")?;
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: 0,
            ttl: Ttl::Persistent,
        });
        entry.value -= 1;
        Ok(entry.value)
    }

    async fn ttl(&self, key: &str) -> Result<Ttl, StoreError> {
        self.record("ttl")?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|e| e.ttl)
            .unwrap_or(Ttl::Missing))
    }
}

#[async_trait]
impl AtomicWindowStore for FakeStore {
    async fn acquire(&self, key: &str, initial: i64, ttl_secs: u64) -> Result<Acquired, StoreError> {
        self.record("acquire")?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.value -= 1;
                Ok(Acquired {
                    created: false,
                    value: entry.value,
                    ttl: entry.ttl,
                })
            }
            None => {
                let ttl = Ttl::Expires(ttl_secs as i64);
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: initial,
                        ttl,
                    },
                );
                Ok(Acquired {
                    created: true,
                    value: initial,
                    ttl,
                })
            }
        }
    }
}
