//! Read-through accessor.
//!
//! Wraps a data-store load in a cache lookup. On hit the loader is never
//! invoked; on miss the loader runs and its result is stored under the key
//! with the configured TTL. Any cache failure — connect, fetch, serialize,
//! deserialize — degrades to a miss and is logged, so an unavailable cache
//! store never fails a request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::store::CacheStore;

#[derive(Clone)]
pub struct ReadThrough {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
}

impl ReadThrough {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_seconds),
            enabled: config.enabled,
        }
    }

    /// Fetch a value through the cache, loading from the source of truth on
    /// a miss. The loader's error type passes through untouched.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            return loader().await;
        }

        let rendered = key.render();

        match self.store.get(&rendered).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    counter!("ateneo_cache_hit_total").increment(1);
                    return Ok(value);
                }
                Err(error) => {
                    // A cached payload that no longer deserializes is stale
                    // by definition; drop it and reload.
                    warn!(key = %rendered, %error, "cached payload undecodable, reloading");
                    counter!("ateneo_cache_error_total").increment(1);
                    if let Err(error) = self.store.delete(&rendered).await {
                        warn!(key = %rendered, %error, "failed to drop undecodable cache entry");
                    }
                }
            },
            Ok(None) => {}
            Err(error) => {
                warn!(key = %rendered, %error, "cache fetch failed, falling through to loader");
                counter!("ateneo_cache_error_total").increment(1);
            }
        }

        counter!("ateneo_cache_miss_total").increment(1);
        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(error) = self.store.set(&rendered, raw, self.ttl).await {
                    warn!(key = %rendered, %error, "cache store failed, serving uncached");
                    counter!("ateneo_cache_error_total").increment(1);
                }
            }
            Err(error) => {
                warn!(key = %rendered, %error, "value not serializable for cache");
                counter!("ateneo_cache_error_total").increment(1);
            }
        }

        Ok(value)
    }
}
