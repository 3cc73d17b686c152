//! Cache configuration.

use serde::Deserialize;

const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Cache settings resolved from `ateneo.toml`.
///
/// With `enabled = false` (or no Redis URL configured) the read-through
/// accessor passes straight through to loaders and the invalidation engine
/// does nothing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Redis connection URL; `None` selects the in-memory store.
    pub url: Option<String>,
    /// TTL applied to every populated entry, in seconds.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            url: settings.url.clone(),
            ttl_seconds: settings.ttl_seconds.get(),
        }
    }
}
