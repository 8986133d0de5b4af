// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cache Module
//!
//! Key-value caching for hot read paths.
//!
//! - [`KeyValueCache`]: two-operation backend contract (get / set with TTL)
//! - [`MemoryCache`]: in-process LRU with per-entry expiry (default backend)
//! - `RedisCache`: shared Redis backend (`redis` feature)
//! - [`UserSessionCache`]: typed read-through cache of users keyed by ID

use std::time::Duration;

use async_trait::async_trait;

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod session;

pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;
pub use session::UserSessionCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Byte-oriented key-value store with per-entry expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Value stored under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key` for `ttl`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Check that the backend answers.
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
