//! Generic cache-aside lookup service.
//!
//! One [`CatalogLookupService`] exists per entity kind. Every call walks the
//! same path: check the cache, on a miss ask the search backend, on success
//! write the result back. Concurrent misses on one key each query the
//! backend and each populate the cache; the writes are whole-value sets, so
//! the last one simply wins.

use std::marker::PhantomData;
use std::sync::Arc;

use cinedex_core::{CatalogEntity, CatalogError, CatalogResult, EntityId, KindProfile, QuerySpec};
use cinedex_storage::{
    CacheBackend, CacheKeyBuilder, Projection, ReadThroughCache, SearchBackend,
    SearchQueryBuilder,
};
use tracing::Instrument;

/// Cache-aside lookups for one entity kind.
pub struct CatalogLookupService<E, C, B>
where
    E: CatalogEntity,
    C: CacheBackend,
    B: SearchBackend,
{
    profile: KindProfile,
    cache: ReadThroughCache<C>,
    search: Arc<B>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, C, B> CatalogLookupService<E, C, B>
where
    E: CatalogEntity,
    C: CacheBackend,
    B: SearchBackend,
{
    /// Create a service using the kind's default profile.
    pub fn new(cache: ReadThroughCache<C>, search: Arc<B>) -> Self {
        Self {
            profile: E::kind().profile(),
            cache,
            search,
            _entity: PhantomData,
        }
    }

    /// Read from a differently named index.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.profile = self.profile.with_index(index);
        self
    }

    pub fn profile(&self) -> &KindProfile {
        &self.profile
    }

    pub fn cache(&self) -> &ReadThroughCache<C> {
        &self.cache
    }

    /// Fetch one full record.
    ///
    /// Returns `Ok(None)` when the index holds no such id. Absent records
    /// are not cached. Backend failures other than "not found" are returned
    /// as errors and leave the cache untouched.
    pub async fn get_by_id(&self, id: EntityId) -> CatalogResult<Option<E>> {
        let key = CacheKeyBuilder::record(self.profile.kind, id);
        let span = tracing::debug_span!("catalog_get", kind = %self.profile.kind, key = %key);

        async {
            if let Some(record) = self.cache.get_json::<E>(&key).await {
                tracing::debug!(outcome = "hit", "record served from cache");
                return Ok(Some(record));
            }

            let fetched = self
                .search
                .fetch_by_id::<E>(
                    self.profile.kind,
                    &self.profile.index,
                    id,
                    self.profile.full_fields,
                )
                .await;

            match fetched {
                Ok(record) => {
                    self.cache.populate_json(&key, &record).await;
                    tracing::debug!(outcome = "populated", "record fetched and cached");
                    Ok(Some(record))
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(outcome = "not_found", "record not in index");
                    Ok(None)
                }
                Err(e) => {
                    tracing::error!(error = %e, index = %self.profile.index, "search backend failed");
                    Err(CatalogError::from(e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fetch one page of brief records.
    ///
    /// Zero hits is a valid answer and is cached like any other page. A
    /// failed backend call is never cached.
    pub async fn list(&self, spec: &QuerySpec) -> CatalogResult<Vec<E::Brief>> {
        let key = CacheKeyBuilder::listing(self.profile.kind, spec);
        let span = tracing::debug_span!("catalog_list", kind = %self.profile.kind, key = %key);

        async {
            if let Some(page) = self.cache.get_json::<Vec<E::Brief>>(&key).await {
                tracing::debug!(outcome = "hit", count = page.len(), "page served from cache");
                return Ok(page);
            }

            let query = SearchQueryBuilder::build(&self.profile, spec, Projection::Brief);
            match self.search.search::<E::Brief>(&query).await {
                Ok(page) => {
                    self.cache.populate_json(&key, &page).await;
                    tracing::debug!(outcome = "populated", count = page.len(), "page fetched and cached");
                    Ok(page)
                }
                Err(e) => {
                    tracing::error!(error = %e, index = %query.index, "search backend failed");
                    Err(CatalogError::from(e))
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl<E, C, B> Clone for CatalogLookupService<E, C, B>
where
    E: CatalogEntity,
    C: CacheBackend,
    B: SearchBackend,
{
    fn clone(&self) -> Self {
        Self {
            profile: self.profile.clone(),
            cache: self.cache.clone(),
            search: Arc::clone(&self.search),
            _entity: PhantomData,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
