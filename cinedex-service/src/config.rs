//! Service Configuration Module
//!
//! Connection settings for the search cluster and the cache store, loaded
//! from environment variables with development defaults.

use std::time::Duration;

use cinedex_core::ConfigError;
use cinedex_storage::{CacheConfig, ElasticsearchConfig};

/// Default search cluster URL.
pub const DEFAULT_ELASTIC_URL: &str = "http://localhost:9200";

/// Default cache store URL.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Default timeout for one backend request, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Connection settings for one catalog lookup process.
#[derive(Clone)]
pub struct CatalogConfig {
    pub elastic_url: String,
    pub elastic_user: Option<String>,
    pub elastic_password: Option<String>,
    pub redis_url: String,
    /// When false every lookup goes straight to the search backend.
    pub cache_enabled: bool,
    /// Timeout for one search request or cache command.
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            elastic_url: DEFAULT_ELASTIC_URL.to_string(),
            elastic_user: None,
            elastic_password: None,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_enabled: true,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl CatalogConfig {
    /// Create CatalogConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CINEDEX_ELASTIC_URL`: Search cluster URL (default: http://localhost:9200)
    /// - `CINEDEX_ELASTIC_USER`: Basic auth user (optional)
    /// - `CINEDEX_ELASTIC_PASSWORD`: Basic auth password (optional)
    /// - `CINEDEX_REDIS_URL`: Cache store URL (default: redis://localhost:6379)
    /// - `CINEDEX_CACHE_ENABLED`: "false" disables caching (default: true)
    /// - `CINEDEX_REQUEST_TIMEOUT_MS`: Per-request timeout (default: 5000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let elastic_url = non_empty("CINEDEX_ELASTIC_URL")
            .unwrap_or_else(|| DEFAULT_ELASTIC_URL.to_string());

        let redis_url =
            non_empty("CINEDEX_REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let cache_enabled = non_empty("CINEDEX_CACHE_ENABLED")
            .map(|s| s.trim().to_lowercase() != "false" && s.trim() != "0")
            .unwrap_or(true);

        let request_timeout_ms = non_empty("CINEDEX_REQUEST_TIMEOUT_MS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        Self {
            elastic_url,
            elastic_user: non_empty("CINEDEX_ELASTIC_USER"),
            elastic_password: non_empty("CINEDEX_ELASTIC_PASSWORD"),
            redis_url,
            cache_enabled,
            request_timeout: Duration::from_millis(request_timeout_ms),
        }
    }

    pub fn with_elastic_url(mut self, url: impl Into<String>) -> Self {
        self.elastic_url = url.into();
        self
    }

    pub fn with_elastic_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.elastic_user = Some(user.into());
        self.elastic_password = Some(password.into());
        self
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check the settings before any client is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.elastic_url.starts_with("http://") || self.elastic_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "CINEDEX_ELASTIC_URL".to_string(),
                value: self.elastic_url.clone(),
                reason: "must be an http(s) url".to_string(),
            });
        }

        if !["redis://", "rediss://", "redis+unix://", "unix://"]
            .iter()
            .any(|scheme| self.redis_url.starts_with(scheme))
        {
            return Err(ConfigError::InvalidValue {
                field: "CINEDEX_REDIS_URL".to_string(),
                value: self.redis_url.clone(),
                reason: "must be a redis:// or rediss:// url".to_string(),
            });
        }

        if self.elastic_password.is_some() && self.elastic_user.is_none() {
            return Err(ConfigError::MissingRequired {
                field: "CINEDEX_ELASTIC_USER".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "CINEDEX_REQUEST_TIMEOUT_MS".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Settings for the search client.
    pub fn elasticsearch(&self) -> ElasticsearchConfig {
        ElasticsearchConfig {
            url: self.elastic_url.clone(),
            username: self.elastic_user.clone(),
            password: self.elastic_password.clone(),
            timeout: self.request_timeout,
        }
    }

    /// Settings for the read-through cache. The TTL is fixed.
    pub fn cache(&self) -> CacheConfig {
        CacheConfig::default().with_enabled(self.cache_enabled)
    }
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("elastic_url", &self.elastic_url)
            .field("elastic_user", &self.elastic_user)
            .field(
                "elastic_password",
                &self.elastic_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redis_url", &self.redis_url)
            .field("cache_enabled", &self.cache_enabled)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
