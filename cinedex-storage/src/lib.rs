//! cinedex Storage - Cache and Search Backends
//!
//! The two stores a catalog lookup touches: a key-value cache holding
//! serialized records for a bounded time, and a document search index that
//! owns the data. Each has a trait, a network adapter, and an in-memory
//! implementation for tests.

pub mod cache;
pub mod search;

pub use cache::{
    CacheBackend, CacheConfig, CacheKey, CacheKeyBuilder, CacheStats, InMemoryCacheBackend,
    ReadThroughCache, RedisCacheBackend, DEFAULT_ENTRY_TTL,
};
pub use search::{
    BackendQuery, ElasticsearchBackend, ElasticsearchConfig, InMemorySearchBackend, Projection,
    QueryClause, SearchBackend, SearchQueryBuilder, SortClause, SortOrder, SourceDocument,
};
