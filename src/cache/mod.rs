//! Ateneo cache system.
//!
//! A lookaside cache over the university → course → term → subject →
//! artifact tree:
//!
//! - **Key derivation** ([`keys`]): one enum, one rendered string per
//!   (entity kind, scope). Both the read path and the write path derive
//!   keys here, so they can never drift apart.
//! - **Store** ([`store`]): TTL key-value backend behind [`CacheStore`],
//!   with Redis and in-memory implementations.
//! - **Read-through accessor** ([`read_through`]): populates on miss,
//!   absorbs every cache failure as a miss.
//! - **Invalidation engine** ([`invalidation`]): maps each entity mutation
//!   to the closure of keys that could now be stale and deletes them before
//!   the HTTP response is produced.
//!
//! ## Configuration
//!
//! Controlled via `ateneo.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! url = "redis://127.0.0.1:6379"
//! ttl_seconds = 3600
//! ```

mod config;
mod invalidation;
mod keys;
mod read_through;
mod store;

pub use config::CacheConfig;
pub use invalidation::{InvalidationEngine, InvalidationTarget, Mutation};
pub use keys::{CacheKey, COURSES_PATTERN, UNIVERSITIES_PATTERN};
pub use read_through::ReadThrough;
pub use store::{CacheError, CacheStore, MemoryStore, RedisStore};
