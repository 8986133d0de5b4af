// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-through cache of users keyed by user ID.
//!
//! ## Fallback policy
//!
//! The cache is an accelerator only. Backend errors, timeouts and entries
//! that fail to decode are logged at `warn` and treated as misses; writes are
//! best-effort. Repository errors on the load path do propagate.
//!
//! Entries are not invalidated when a user changes. A cached user may be
//! stale for at most the configured TTL.

use std::sync::Arc;
use std::time::Duration;

use crate::storage::{StorageResult, User, UserLookup};

use super::KeyValueCache;

/// Default lifetime of a cached user.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60);

/// Default upper bound on a single backend call.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct UserSessionCache {
    backend: Arc<dyn KeyValueCache>,
    ttl: Duration,
    timeout: Duration,
}

impl UserSessionCache {
    pub fn new(backend: Arc<dyn KeyValueCache>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            backend,
            ttl,
            timeout,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Cached user for `user_id`, if any.
    pub async fn get(&self, user_id: &str) -> Option<User> {
        let bytes = match tokio::time::timeout(self.timeout, self.backend.get(user_id)).await {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                tracing::warn!(user_id, backend = self.backend.name(), error = %e, "Session cache read failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(user_id, backend = self.backend.name(), "Session cache read timed out");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Discarding undecodable session cache entry");
                None
            }
        }
    }

    /// Cache `user` for the configured TTL.
    pub async fn put(&self, user: &User) {
        self.put_with_ttl(user, self.ttl).await;
    }

    /// Cache `user` for `ttl`. Failures are logged and swallowed.
    pub async fn put_with_ttl(&self, user: &User, ttl: Duration) {
        let bytes = match serde_json::to_vec(user) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to encode user for session cache");
                return;
            }
        };

        match tokio::time::timeout(self.timeout, self.backend.set(&user.id, bytes, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(user_id = %user.id, backend = self.backend.name(), error = %e, "Session cache write failed");
            }
            Err(_) => {
                tracing::warn!(user_id = %user.id, backend = self.backend.name(), "Session cache write timed out");
            }
        }
    }

    /// Cached user, or load it from `lookup` and cache it.
    pub async fn get_or_load<L>(&self, user_id: &str, lookup: &L) -> StorageResult<User>
    where
        L: UserLookup + ?Sized,
    {
        if let Some(user) = self.get(user_id).await {
            tracing::debug!(user_id, "Session cache hit");
            return Ok(user);
        }

        let user = User::from(lookup.user_by_id(user_id)?);
        self.put(&user).await;
        Ok(user)
    }

    /// Readiness probe: does the backend answer within the timeout?
    pub async fn is_available(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, self.backend.ping()).await,
            Ok(Ok(()))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::storage::{StorageError, StoredUser};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Repository stub that counts lookups.
    #[derive(Default)]
    struct CountingLookup {
        users: Mutex<HashMap<String, StoredUser>>,
        calls: AtomicUsize,
    }

    impl CountingLookup {
        fn with(user: StoredUser) -> Self {
            let lookup = Self::default();
            lookup.users.lock().unwrap().insert(user.id.clone(), user);
            lookup
        }

        fn rename(&self, user_id: &str, username: &str) {
            let mut users = self.users.lock().unwrap();
            users.get_mut(user_id).unwrap().username = username.to_string();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl UserLookup for CountingLookup {
        fn user_by_id(&self, user_id: &str) -> StorageResult<StoredUser> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.users
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("User {user_id}")))
        }

        fn user_by_email(&self, email: &str) -> StorageResult<StoredUser> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("User with email {email}")))
        }
    }

    struct FailingCache;

    #[async_trait]
    impl KeyValueCache for FailingCache {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    struct SlowCache;

    #[async_trait]
    impl KeyValueCache for SlowCache {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn alice() -> StoredUser {
        StoredUser::new("alice".into(), "a@b.com".into(), "digest".into())
    }

    fn memory_sessions(ttl: Duration) -> UserSessionCache {
        UserSessionCache::new(Arc::new(MemoryCache::new(16)), ttl, DEFAULT_CACHE_TIMEOUT)
    }

    #[tokio::test]
    async fn miss_falls_through_then_hit_skips_repository() {
        let user = alice();
        let lookup = CountingLookup::with(user.clone());
        let sessions = memory_sessions(DEFAULT_SESSION_TTL);

        let first = sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(first.id, user.id);
        assert_eq!(lookup.calls(), 1);

        let second = sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn put_warms_cache_for_reads() {
        let user = alice();
        let lookup = CountingLookup::with(user.clone());
        let sessions = memory_sessions(DEFAULT_SESSION_TTL);

        sessions.put(&User::from(user.clone())).await;
        sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn update_is_invisible_until_ttl_expires() {
        let user = alice();
        let lookup = CountingLookup::with(user.clone());
        let sessions = memory_sessions(Duration::from_millis(50));

        sessions.get_or_load(&user.id, &lookup).await.unwrap();
        lookup.rename(&user.id, "alice2");

        let stale = sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(stale.username, "alice");

        tokio::time::sleep(Duration::from_millis(80)).await;
        let fresh = sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(fresh.username, "alice2");
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_repository() {
        let user = alice();
        let lookup = CountingLookup::with(user.clone());
        let sessions =
            UserSessionCache::new(Arc::new(FailingCache), DEFAULT_SESSION_TTL, DEFAULT_CACHE_TIMEOUT);

        assert!(sessions.get(&user.id).await.is_none());
        sessions.put(&User::from(user.clone())).await;

        let loaded = sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(loaded.id, user.id);
        assert!(!sessions.is_available().await);
        assert_eq!(sessions.ttl(), DEFAULT_SESSION_TTL);
        assert_eq!(sessions.backend_name(), "failing");
    }

    #[tokio::test]
    async fn slow_backend_times_out_as_miss() {
        let user = alice();
        let lookup = CountingLookup::with(user.clone());
        let sessions = UserSessionCache::new(
            Arc::new(SlowCache),
            DEFAULT_SESSION_TTL,
            Duration::from_millis(20),
        );

        let started = std::time::Instant::now();
        let loaded = sessions.get_or_load(&user.id, &lookup).await.unwrap();
        assert_eq!(loaded.id, user.id);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let backend = Arc::new(MemoryCache::new(4));
        backend
            .set("u1", b"not json".to_vec(), DEFAULT_SESSION_TTL)
            .await
            .unwrap();
        let sessions = UserSessionCache::new(backend, DEFAULT_SESSION_TTL, DEFAULT_CACHE_TIMEOUT);

        assert!(sessions.get("u1").await.is_none());
    }

    #[tokio::test]
    async fn unknown_user_propagates_not_found() {
        let lookup = CountingLookup::default();
        let sessions = memory_sessions(DEFAULT_SESSION_TTL);

        let result = sessions.get_or_load("ghost", &lookup).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
