//! Kind-dispatching facade over the per-kind services.

use std::sync::Arc;

use cinedex_core::{
    BriefRecord, CatalogEntity, CatalogResult, EntityId, EntityKind, Film, FullRecord, Genre,
    Person, QuerySpec,
};
use cinedex_storage::{CacheBackend, ReadThroughCache, SearchBackend};

use super::catalog::CatalogLookupService;

/// The three lookup services, built once and shared read-only.
///
/// This is the surface an outer transport layer calls. Records come back
/// kind-erased as [`FullRecord`] and [`BriefRecord`].
pub struct ServiceRegistry<C, B>
where
    C: CacheBackend,
    B: SearchBackend,
{
    movies: CatalogLookupService<Film, C, B>,
    genres: CatalogLookupService<Genre, C, B>,
    persons: CatalogLookupService<Person, C, B>,
}

impl<C, B> ServiceRegistry<C, B>
where
    C: CacheBackend,
    B: SearchBackend,
{
    /// Build all services over one shared cache and search client.
    pub fn new(cache: ReadThroughCache<C>, search: Arc<B>) -> Self {
        Self {
            movies: CatalogLookupService::new(cache.clone(), Arc::clone(&search)),
            genres: CatalogLookupService::new(cache.clone(), Arc::clone(&search)),
            persons: CatalogLookupService::new(cache, search),
        }
    }

    pub fn movies(&self) -> &CatalogLookupService<Film, C, B> {
        &self.movies
    }

    pub fn genres(&self) -> &CatalogLookupService<Genre, C, B> {
        &self.genres
    }

    pub fn persons(&self) -> &CatalogLookupService<Person, C, B> {
        &self.persons
    }

    /// Full record of `kind` with `id`, or `None` if the index has no such id.
    pub async fn get_by_id(&self, kind: EntityKind, id: EntityId) -> CatalogResult<Option<FullRecord>> {
        let record = match kind {
            EntityKind::Movie => self
                .movies
                .get_by_id(id)
                .await?
                .map(Film::into_full_record),
            EntityKind::Genre => self
                .genres
                .get_by_id(id)
                .await?
                .map(Genre::into_full_record),
            EntityKind::Person => self
                .persons
                .get_by_id(id)
                .await?
                .map(Person::into_full_record),
        };
        Ok(record)
    }

    /// One listing page of `kind`.
    pub async fn list(&self, kind: EntityKind, spec: &QuerySpec) -> CatalogResult<Vec<BriefRecord>> {
        let page = match kind {
            EntityKind::Movie => self
                .movies
                .list(spec)
                .await?
                .into_iter()
                .map(Film::brief_into_record)
                .collect(),
            EntityKind::Genre => self
                .genres
                .list(spec)
                .await?
                .into_iter()
                .map(Genre::brief_into_record)
                .collect(),
            EntityKind::Person => self
                .persons
                .list(spec)
                .await?
                .into_iter()
                .map(Person::brief_into_record)
                .collect(),
        };
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_storage::{InMemoryCacheBackend, InMemorySearchBackend};
    use serde_json::json;

    fn registry() -> (
        ServiceRegistry<InMemoryCacheBackend, InMemorySearchBackend>,
        Arc<InMemorySearchBackend>,
    ) {
        let search = Arc::new(InMemorySearchBackend::new());
        let cache = ReadThroughCache::with_defaults(Arc::new(InMemoryCacheBackend::new()));
        (ServiceRegistry::new(cache, Arc::clone(&search)), search)
    }

    #[tokio::test]
    async fn test_dispatch_by_kind() {
        let (registry, search) = registry();
        let id = EntityId::new_random();
        search.insert(
            "persons",
            json!({ "id": id.to_string(), "full_name": "George Lucas", "films": [] }),
        );
        search.create_index("movies");

        let person = registry.get_by_id(EntityKind::Person, id).await.unwrap();
        match person {
            Some(FullRecord::Person(person)) => assert_eq!(person.full_name, "George Lucas"),
            other => panic!("unexpected record: {:?}", other),
        }

        // Same id, other kind: a different key and a different index.
        assert_eq!(registry.get_by_id(EntityKind::Movie, id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_wraps_briefs() {
        let (registry, search) = registry();
        search.insert(
            "genres",
            json!({ "id": EntityId::new_random().to_string(), "name": "Western", "description": "Guns" }),
        );

        let page = registry
            .list(EntityKind::Genre, &QuerySpec::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].kind(), EntityKind::Genre);
    }

    #[tokio::test]
    async fn test_services_share_one_cache() {
        let (registry, search) = registry();
        search.create_index("movies");
        search.create_index("genres");

        registry.list(EntityKind::Movie, &QuerySpec::default()).await.unwrap();
        registry.list(EntityKind::Genre, &QuerySpec::default()).await.unwrap();

        assert_eq!(registry.movies().cache().stats().writes, 2);
        assert_eq!(registry.genres().cache().stats().writes, 2);
    }
}
