//! In-process shared store.
//!
//! Workers running inside one process share a single `MemoryStore` through
//! `Arc`. Expiry is lazy: an expired entry is treated as absent and evicted
//! by the next operation that touches it.

use std::time::Duration;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::store::{SharedStore, StoreError, StoreResult};

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// A concurrent in-memory key-value store with optional per-key expiry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    /// Return true if the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
        let now = Instant::now();
        let found = self.entries.get(key).map(|e| *e.value());
        match found {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value)),
            Some(_) => {
                self.entries.remove_if(key, |_, e| !e.is_live(now));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: i64) -> StoreResult<()> {
        self.entries.insert(key.to_string(), Entry { value, expires_at: None });
        Ok(())
    }

    async fn add(&self, key: &str, value: i64, ttl: Option<Duration>) -> StoreResult<()> {
        let now = Instant::now();
        let fresh = Entry {
            value,
            expires_at: ttl.map(|ttl| now + ttl),
        };
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return Err(StoreError::Exists);
                }
                occupied.insert(fresh);
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(fresh);
            }
        }
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if !occupied.get().is_live(now) {
                    occupied.remove();
                    return Err(StoreError::NotFound);
                }
                let entry = occupied.get_mut();
                entry.value = entry.value.checked_add(delta).ok_or(StoreError::Overflow)?;
                Ok(entry.value)
            }
            MapEntry::Vacant(_) => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", 7).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(7));

        store.set("a", 0).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(0));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_add_is_exclusive() {
        let store = MemoryStore::new();
        store.add("l:foo", 1, None).await.unwrap();
        assert_eq!(store.add("l:foo", 1, None).await, Err(StoreError::Exists));
    }

    #[tokio::test]
    async fn test_add_after_expiry() {
        let store = MemoryStore::new();
        store.add("l:foo", 1, Some(Duration::from_millis(20))).await.unwrap();
        assert_eq!(
            store.add("l:foo", 1, Some(Duration::from_millis(20))).await,
            Err(StoreError::Exists)
        );

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("l:foo").await.unwrap(), None);
        store.add("l:foo", 2, Some(Duration::from_millis(20))).await.unwrap();
        assert_eq!(store.get("l:foo").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_incr() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("v:foo", 1).await, Err(StoreError::NotFound));

        store.add("v:foo", 0, None).await.unwrap();
        assert_eq!(store.incr("v:foo", 1).await.unwrap(), 1);
        assert_eq!(store.incr("v:foo", 1).await.unwrap(), 2);

        store.set("big", i64::MAX).await.unwrap();
        assert_eq!(store.incr("big", 1).await, Err(StoreError::Overflow));
    }

    #[tokio::test]
    async fn test_concurrent_add_single_winner() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add("l:zone", 1, Some(Duration::from_secs(5))).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
