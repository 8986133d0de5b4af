// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU cache with per-entry TTL.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::{CacheError, KeyValueCache};

/// Default number of entries kept before the least recently used is evicted.
pub const DEFAULT_CAPACITY: usize = 10_000;

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Bounded in-process cache.
pub struct MemoryCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, expired ones included until touched.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, CacheEntry>>, CacheError> {
        self.cache
            .lock()
            .map_err(|_| CacheError::Backend("memory cache lock poisoned".to_string()))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut cache = self.lock()?;
        if let Some(entry) = cache.get(key) {
            if Instant::now() < entry.expires_at {
                return Ok(Some(entry.value.clone()));
            }
            // Expired
            cache.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut cache = self.lock()?;
        cache.put(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn put_and_get() {
        let cache = MemoryCache::new(10);
        assert!(cache.get("k").await.unwrap().is_none());

        cache.set("k", b"v".to_vec(), MINUTE).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = MemoryCache::new(10);
        cache.set("k", b"one".to_vec(), MINUTE).await.unwrap();
        cache.set("k", b"two".to_vec(), MINUTE).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn ttl_expiry() {
        let cache = MemoryCache::new(10);
        cache
            .set("k", b"v".to_vec(), Duration::from_millis(1))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn least_recently_used_is_evicted() {
        let cache = MemoryCache::new(2);
        cache.set("a", b"1".to_vec(), MINUTE).await.unwrap();
        cache.set("b", b"2".to_vec(), MINUTE).await.unwrap();
        // Touch "a" so "b" becomes the eviction candidate
        cache.get("a").await.unwrap();
        cache.set("c", b"3".to_vec(), MINUTE).await.unwrap();

        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = MemoryCache::new(0);
        assert!(cache.is_empty());
    }
}
