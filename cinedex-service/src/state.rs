//! Long-lived clients shared by every lookup.

use std::sync::Arc;

use cinedex_core::{CatalogResult, ConfigError};
use cinedex_storage::{
    CacheBackend, ElasticsearchBackend, ReadThroughCache, RedisCacheBackend, SearchBackend,
};

use crate::config::CatalogConfig;
use crate::services::ServiceRegistry;

/// Context backed by Redis and Elasticsearch.
pub type ProductionContext = AppContext<RedisCacheBackend, ElasticsearchBackend>;

/// Registry backed by Redis and Elasticsearch.
pub type ProductionRegistry = ServiceRegistry<RedisCacheBackend, ElasticsearchBackend>;

/// Owns the cache and search clients for the lifetime of the process.
///
/// Built once at startup and handed to whatever serves requests. Clients
/// are shared through `Arc`; they close when the last handle drops.
pub struct AppContext<C, B>
where
    C: CacheBackend,
    B: SearchBackend,
{
    config: CatalogConfig,
    cache: ReadThroughCache<C>,
    search: Arc<B>,
}

impl<C, B> AppContext<C, B>
where
    C: CacheBackend,
    B: SearchBackend,
{
    /// Assemble a context from already built clients.
    pub fn new(config: CatalogConfig, cache: Arc<C>, search: Arc<B>) -> Self {
        let cache = ReadThroughCache::new(cache, config.cache());
        Self {
            config,
            cache,
            search,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn cache(&self) -> &ReadThroughCache<C> {
        &self.cache
    }

    pub fn search(&self) -> &Arc<B> {
        &self.search
    }

    /// Build the lookup services over this context's clients.
    pub fn registry(&self) -> ServiceRegistry<C, B> {
        ServiceRegistry::new(self.cache.clone(), Arc::clone(&self.search))
    }

    /// Release this context's client handles.
    pub fn shutdown(self) {
        let stats = self.cache.stats();
        tracing::info!(
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            cache_errors = stats.errors,
            cache_writes = stats.writes,
            hit_rate = stats.hit_rate(),
            "Catalog context shutting down"
        );
        drop(self.cache);
        drop(self.search);
        tracing::info!("Catalog context shutdown complete");
    }
}

impl ProductionContext {
    /// Connect to the search cluster, then the cache store.
    ///
    /// Invalid settings fail. An unreachable cluster or cache store at
    /// startup is only logged: the cluster may come up later, and the cache
    /// is optional.
    pub async fn connect(config: &CatalogConfig) -> CatalogResult<Self> {
        config.validate()?;

        let search = ElasticsearchBackend::new(config.elasticsearch())?;
        match search.ping().await {
            Ok(()) => tracing::info!(url = %config.elastic_url, "Search cluster reachable"),
            Err(e) => tracing::warn!(
                url = %config.elastic_url,
                error = %e,
                "Search cluster not reachable at startup"
            ),
        }

        let cache = RedisCacheBackend::new(&config.redis_url)
            .map_err(|e| ConfigError::InvalidValue {
                field: "CINEDEX_REDIS_URL".to_string(),
                value: config.redis_url.clone(),
                reason: e.to_string(),
            })?
            .with_command_timeout(config.request_timeout);

        if config.cache_enabled {
            match cache.ping().await {
                Ok(()) => tracing::info!(url = %config.redis_url, "Cache store reachable"),
                Err(e) => tracing::warn!(
                    url = %config.redis_url,
                    error = %e,
                    "Cache store not reachable at startup, lookups will bypass it until it is"
                ),
            }
        } else {
            tracing::info!("Cache disabled by configuration");
        }

        Ok(Self::new(config.clone(), Arc::new(cache), Arc::new(search)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_core::CatalogError;
    use cinedex_storage::{InMemoryCacheBackend, InMemorySearchBackend};

    #[test]
    fn test_context_applies_cache_config() {
        let context = AppContext::new(
            CatalogConfig::default().with_cache_enabled(false),
            Arc::new(InMemoryCacheBackend::new()),
            Arc::new(InMemorySearchBackend::new()),
        );
        assert!(!context.cache().config().enabled);
        assert_eq!(
            context.cache().config().entry_ttl,
            std::time::Duration::from_secs(300)
        );
        context.shutdown();
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = CatalogConfig::default().with_elastic_url("ftp://nowhere");
        let err = ProductionContext::connect(&config).await.err().unwrap();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[tokio::test]
    async fn test_connect_survives_unreachable_stores() {
        let config = CatalogConfig::default()
            .with_elastic_url("http://127.0.0.1:1")
            .with_redis_url("redis://127.0.0.1:1")
            .with_request_timeout(std::time::Duration::from_millis(300));

        let context = ProductionContext::connect(&config).await.unwrap();
        assert!(context.cache().config().enabled);
        context.shutdown();
    }
}
