//! Cache backend trait and usage statistics.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cinedex_core::CacheError;

/// Key-value store holding serialized records with a per-entry TTL.
///
/// Implementations must be safe to share across tasks. Keys are opaque
/// strings produced by [`CacheKeyBuilder`](super::CacheKeyBuilder); values
/// are whatever bytes the caller stored. A backend that cannot reach its
/// store reports [`CacheError::Unavailable`] and leaves the decision to
/// degrade to the caller.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Store `value` under `key`, replacing any previous value, expiring
    /// after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration)
        -> Result<(), CacheError>;

    /// Round-trip to the store to check that it answers.
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Snapshot of read-through cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from the cache.
    pub hits: u64,
    /// Reads that found nothing usable.
    pub misses: u64,
    /// Cache operations that failed and were degraded.
    pub errors: u64,
    /// Successful writes.
    pub writes: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
