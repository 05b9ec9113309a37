//! Read-through cache wrapper.
//!
//! [`ReadThroughCache`] sits between the lookup services and a
//! [`CacheBackend`]. It never fails a read: store errors are logged, counted,
//! and reported as misses, so the caller falls through to the search
//! backend. Writes come in two flavours, [`set`](ReadThroughCache::set)
//! which returns the store error, and [`populate`](ReadThroughCache::populate)
//! which swallows it after logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cinedex_core::CacheError;
use serde::{de::DeserializeOwned, Serialize};

use super::keys::CacheKey;
use super::traits::{CacheBackend, CacheStats};

/// Lifetime of every cache entry unless configured otherwise.
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(300);

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub entry_ttl: Duration,
    /// When false, reads always miss and writes are skipped.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: DEFAULT_ENTRY_TTL,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    writes: AtomicU64,
}

/// Degrading cache-aside wrapper around a [`CacheBackend`].
///
/// Cloning is cheap; clones share the backend and the counters.
pub struct ReadThroughCache<C>
where
    C: CacheBackend,
{
    backend: Arc<C>,
    config: CacheConfig,
    counters: Arc<Counters>,
}

impl<C> ReadThroughCache<C>
where
    C: CacheBackend,
{
    /// Create a new read-through cache.
    pub fn new(backend: Arc<C>, config: CacheConfig) -> Self {
        Self {
            backend,
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create a new read-through cache with default configuration.
    pub fn with_defaults(backend: Arc<C>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the cache backend.
    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Read raw bytes. Store errors are logged and reported as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        if !self.config.enabled {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match self.backend.get(key.as_str()).await {
            Ok(Some(value)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed, treating as miss");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write raw bytes with an explicit TTL, returning any store error.
    pub async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        if !self.config.enabled {
            return Ok(());
        }

        self.backend.set_with_ttl(key.as_str(), value, ttl).await?;
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Best-effort write with the configured TTL.
    pub async fn populate(&self, key: &CacheKey, value: Bytes) {
        if let Err(e) = self.set(key, value, self.config.entry_ttl).await {
            tracing::warn!(key = %key, error = %e, "cache write failed");
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Read and decode a JSON payload.
    ///
    /// A payload that does not decode as `T` is logged and reported as a
    /// miss; the caller's next populate overwrites it.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = self.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                let error = CacheError::Deserialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!(key = %key, error = %error, "discarding undecodable cache entry");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                // Recorded as a hit by `get`; it was not one.
                self.counters.hits.fetch_sub(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Encode `value` as JSON and populate the cache with it.
    pub async fn populate_json<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        if !self.config.enabled {
            return;
        }

        match serde_json::to_vec(value) {
            Ok(encoded) => self.populate(key, Bytes::from(encoded)).await,
            Err(e) => {
                let error = CacheError::Serialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!(key = %key, error = %error, "cache payload encoding failed");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
        }
    }

    /// Check that the store answers.
    pub async fn ping(&self) -> Result<(), CacheError> {
        self.backend.ping().await
    }
}

impl<C> Clone for ReadThroughCache<C>
where
    C: CacheBackend,
{
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
