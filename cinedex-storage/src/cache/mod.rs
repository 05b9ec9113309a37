//! Cache layer for catalog lookups.
//!
//! Serialized records and listing pages live in a key-value store under
//! deterministic keys, each with a fixed TTL. There is no invalidation:
//! staleness is bounded by the TTL alone.
//!
//! # Degradation
//!
//! The cache is an accelerator, never a dependency. [`ReadThroughCache`]
//! turns every store failure into a miss on read and a logged warning on
//! write, so an unreachable store only costs latency.
//!
//! # Example
//!
//! ```ignore
//! let cache = ReadThroughCache::with_defaults(Arc::new(RedisCacheBackend::new(url)?));
//! let key = CacheKeyBuilder::record(EntityKind::Movie, id);
//!
//! if let Some(film) = cache.get_json::<Film>(&key).await {
//!     return Ok(Some(film));
//! }
//! let film = search.fetch_by_id::<Film>(...).await?;
//! cache.populate_json(&key, &film).await;
//! ```

pub mod keys;
pub mod memory;
pub mod read_through;
pub mod redis_backend;
pub mod traits;

pub use keys::{CacheKey, CacheKeyBuilder};
pub use memory::InMemoryCacheBackend;
pub use read_through::{CacheConfig, ReadThroughCache, DEFAULT_ENTRY_TTL};
pub use redis_backend::RedisCacheBackend;
pub use traits::{CacheBackend, CacheStats};
