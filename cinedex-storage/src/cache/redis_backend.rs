//! Redis cache backend.
//!
//! Wraps a multiplexed [`ConnectionManager`], which reconnects on its own
//! after a dropped connection. The manager is created lazily on first use so
//! a Redis outage at startup does not prevent the service from starting; each
//! call retries the connection until one succeeds.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cinedex_core::CacheError;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tokio::sync::OnceCell;

use super::traits::CacheBackend;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// [`CacheBackend`] backed by a Redis server.
pub struct RedisCacheBackend {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    command_timeout: Duration,
}

impl RedisCacheBackend {
    /// Create a backend for `url` (`redis://host:port/db`).
    ///
    /// Only parses the URL; no connection is opened until the first command.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|e| CacheError::Unavailable {
            reason: format!("invalid redis url: {}", e),
        })?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    /// Create a backend and check that the server answers.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let backend = Self::new(url)?;
        backend.ping().await?;
        Ok(backend)
    }

    /// Upper bound for a single command, connection setup included.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                tracing::debug!("opening redis connection manager");
                ConnectionManager::new(self.client.clone()).await
            })
            .await
            .map_err(unavailable)?;
        Ok(manager.clone())
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Unavailable {
                reason: format!(
                    "redis {} timed out after {}ms",
                    operation,
                    self.command_timeout.as_millis()
                ),
            }),
        }
    }
}

fn unavailable(error: RedisError) -> CacheError {
    CacheError::Unavailable {
        reason: error.to_string(),
    }
}

/// Redis rejects `EX 0`, so sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.bounded("GET", async {
            let mut conn = self.connection().await?;
            let value: Option<Vec<u8>> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut conn)
                .await
                .map_err(unavailable)?;
            Ok(value.map(Bytes::from))
        })
        .await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.bounded("SET", async {
            let mut conn = self.connection().await?;
            redis::cmd("SET")
                .arg(key)
                .arg(value.as_ref())
                .arg("EX")
                .arg(ttl_seconds(ttl))
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(unavailable)
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.bounded("PING", async {
            let mut conn = self.connection().await?;
            let reply: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(unavailable)?;
            if reply == "PONG" {
                Ok(())
            } else {
                Err(CacheError::Unavailable {
                    reason: format!("unexpected PING reply: {}", reply),
                })
            }
        })
        .await
    }
}
