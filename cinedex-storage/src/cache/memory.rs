//! Process-local cache backend.
//!
//! Used by tests and by deployments that run without a shared store. Entries
//! expire lazily on read. The backend can be switched offline to simulate an
//! unreachable store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use cinedex_core::CacheError;

use super::traits::CacheBackend;

struct Entry {
    value: Bytes,
    expires_at: Instant,
    ttl: Duration,
}

/// In-memory [`CacheBackend`] with TTL expiry.
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, Entry>>,
    online: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Take the store offline (every call fails) or bring it back.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Make writes fail while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls that reached the store.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored bytes, ignoring expiry and the online flag.
    pub fn peek(&self, key: &str) -> Option<Bytes> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).map(|entry| entry.value.clone()))
    }

    /// TTL the entry under `key` was written with.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).map(|entry| entry.ttl))
    }

    /// Store bytes directly, bypassing the online flag and counters.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Bytes>, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.into(),
                Entry {
                    value: value.into(),
                    expires_at: Instant::now() + ttl,
                    ttl,
                },
            );
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_online(&self) -> Result<(), CacheError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable {
                reason: "in-memory cache is offline".to_string(),
            })
        }
    }
}

fn poisoned() -> CacheError {
    CacheError::Unavailable {
        reason: "cache lock poisoned".to_string(),
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.ensure_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it unless a writer replaced it in the meantime.
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.ensure_online()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                reason: "in-memory cache rejects writes".to_string(),
            });
        }

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
                ttl,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.ensure_online()
    }
}
