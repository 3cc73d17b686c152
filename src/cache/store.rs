//! Cache store backends.
//!
//! The store speaks strings: callers serialize their values before `set`
//! and deserialize after `get`. Every operation is fallible without being
//! fatal — the accessor and the invalidation engine absorb errors, because
//! the cache is an optimization and never a correctness dependency.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// TTL key-value backend the caching layer issues commands to.
///
/// Deleting a key that does not exist is a no-op, and pattern deletion that
/// matches zero keys succeeds; both are relied on by the invalidation
/// engine's idempotence.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key matching a glob pattern, returning how many were
    /// removed.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;
}

// ============================================================================
// Redis store
// ============================================================================

/// Redis-backed store used in production deployments.
///
/// Connection management is delegated to [`redis::aio::ConnectionManager`],
/// which reconnects on command failure; commands still surface errors so the
/// caller can degrade.
#[derive(Clone)]
pub struct RedisStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.manager.clone();
        let matched: Vec<String> = {
            let mut iter = conn.scan_match::<_, String>(pattern).await?;
            let mut matched = Vec::new();
            while let Some(key) = iter.next_item().await {
                matched.push(key);
            }
            matched
        };

        if matched.is_empty() {
            return Ok(0);
        }

        let mut conn = self.manager.clone();
        let _: () = conn.del(&matched).await?;
        Ok(matched.len() as u64)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-memory store for tests and single-node deployments without Redis.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.value().is_expired(now))
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.value().is_expired(now) {
                return Ok(Some(entry.value().value.clone()));
            }
        }
        // Expired entries are dropped lazily on the next read.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let matched: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| key_matches(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        for key in &matched {
            self.entries.remove(key);
        }
        Ok(matched.len() as u64)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}

/// Glob match supporting a single `*` wildcard, which is all the key
/// namespace uses.
fn key_matches(pattern: &str, key: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == key,
        Some((head, tail)) => {
            key.len() >= head.len() + tail.len() && key.starts_with(head) && key.ends_with(tail)
        }
    }
}
