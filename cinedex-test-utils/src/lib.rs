//! cinedex Test Utilities
//!
//! Shared test infrastructure for the cinedex workspace:
//! - Proptest generators for ids, query specs and records
//! - Fixtures mirroring the seed data of the catalog indices
//! - An in-memory cache and search stack, optionally pre-seeded

use std::sync::Arc;

use cinedex_storage::{
    CacheConfig, InMemoryCacheBackend, InMemorySearchBackend, ReadThroughCache,
};

// Re-export core types for convenience
pub use cinedex_core::{
    BriefRecord, EntityId, EntityKind, Film, FilmBrief, FullRecord, Genre, GenreBrief, Person,
    PersonBrief, QuerySpec, RelatedRef,
};
pub use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalog types.

    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_entity_id() -> impl Strategy<Value = EntityId> {
        arb_uuid().prop_map(EntityId::new)
    }

    pub fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Movie),
            Just(EntityKind::Genre),
            Just(EntityKind::Person),
        ]
    }

    /// Raw sort token: a field name, optionally with a leading `-`.
    pub fn arb_sort_token() -> impl Strategy<Value = String> {
        (any::<bool>(), "[a-z_]{1,12}(\\.raw)?").prop_map(|(descending, field)| {
            if descending {
                format!("-{}", field)
            } else {
                field
            }
        })
    }

    /// Raw free-text term, possibly blank or padded.
    pub fn arb_text_filter() -> impl Strategy<Value = String> {
        "[ ]{0,2}[a-zA-Z0-9:,\" ]{0,16}"
    }

    /// Raw listing parameters, as an outer layer would hand them over.
    #[derive(Debug, Clone)]
    pub struct RawListing {
        pub related: Option<EntityId>,
        pub text: Option<String>,
        pub sort: Option<String>,
        pub page_number: Option<u32>,
        pub page_size: Option<u32>,
    }

    impl RawListing {
        /// Build with the setters applied in declaration order.
        pub fn build_forward(&self) -> QuerySpec {
            let mut builder = QuerySpec::builder()
                .related_opt(self.related)
                .text_opt(self.text.clone())
                .sort_opt(self.sort.clone());
            if let Some(page_number) = self.page_number {
                builder = builder.page_number(page_number);
            }
            if let Some(page_size) = self.page_size {
                builder = builder.page_size(page_size);
            }
            builder.build().unwrap()
        }

        /// Build with the setters applied in reverse order.
        pub fn build_reversed(&self) -> QuerySpec {
            let mut builder = QuerySpec::builder();
            if let Some(page_size) = self.page_size {
                builder = builder.page_size(page_size);
            }
            if let Some(page_number) = self.page_number {
                builder = builder.page_number(page_number);
            }
            builder
                .sort_opt(self.sort.clone())
                .text_opt(self.text.clone())
                .related_opt(self.related)
                .build()
                .unwrap()
        }
    }

    pub fn arb_raw_listing() -> impl Strategy<Value = RawListing> {
        (
            prop::option::of(arb_entity_id()),
            prop::option::of(arb_text_filter()),
            prop::option::of(arb_sort_token()),
            prop::option::of(1u32..1000),
            prop::option::of(1u32..200),
        )
            .prop_map(|(related, text, sort, page_number, page_size)| RawListing {
                related,
                text,
                sort,
                page_number,
                page_size,
            })
    }

    /// Generate a valid, normalized QuerySpec.
    pub fn arb_query_spec() -> impl Strategy<Value = QuerySpec> {
        arb_raw_listing().prop_map(|raw| raw.build_forward())
    }

    pub fn arb_related_ref() -> impl Strategy<Value = RelatedRef> {
        (arb_entity_id(), prop::option::of("[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10})?"))
            .prop_map(|(id, name)| RelatedRef { id, name })
    }

    pub fn arb_rating() -> impl Strategy<Value = Option<f64>> {
        prop::option::of((0u32..=100).prop_map(|tenths| f64::from(tenths) / 10.0))
    }

    pub fn arb_film() -> impl Strategy<Value = Film> {
        (
            arb_entity_id(),
            "[A-Z][a-z]{1,10}( [a-z]{1,10}){0,3}",
            arb_rating(),
            prop::option::of("[a-zA-Z ,.]{0,80}"),
            prop::collection::vec(arb_related_ref(), 0..3),
            prop::collection::vec(arb_related_ref(), 0..4),
            prop::collection::vec(arb_related_ref(), 0..2),
        )
            .prop_map(
                |(id, title, imdb_rating, description, genres, actors, writers)| Film {
                    id,
                    title,
                    imdb_rating,
                    description,
                    genres,
                    actors,
                    writers,
                },
            )
    }

    pub fn arb_genre() -> impl Strategy<Value = Genre> {
        (
            arb_entity_id(),
            "[A-Z][a-z]{2,12}",
            prop::option::of("[a-zA-Z ,.]{0,60}"),
            prop::collection::vec(arb_related_ref(), 0..5),
        )
            .prop_map(|(id, name, description, films)| Genre {
                id,
                name,
                description,
                films,
            })
    }

    pub fn arb_birth_date() -> impl Strategy<Value = Option<NaiveDate>> {
        // 1900-01-01 plus up to ~120 years.
        prop::option::of((0i64..44_000).prop_map(|days| {
            NaiveDate::from_ymd_opt(1900, 1, 1)
                .unwrap()
                .checked_add_days(chrono::Days::new(days as u64))
                .unwrap()
        }))
    }

    pub fn arb_person() -> impl Strategy<Value = Person> {
        (
            arb_entity_id(),
            "[A-Z][a-z]{2,10} [A-Z][a-z]{2,12}",
            arb_birth_date(),
            prop::collection::vec(arb_related_ref(), 0..5),
        )
            .prop_map(|(id, full_name, birth_date, films)| Person {
                id,
                full_name,
                birth_date,
                films,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Records matching the seed data the catalog tests run against.

    use super::*;
    use chrono::NaiveDate;

    pub const SOME_FILM_ID: &str = "bb74a838-584e-11ec-9885-c13c488d29c0";
    pub const WESTERN_GENRE_ID: &str = "0b105f87-e0a5-45dc-8ce7-f8632088f390";
    pub const SOME_PERSON_ID: &str = "6960e2ca-889f-41f5-b728-1e7313e54d6c";
    pub const OTHER_FILM_ID: &str = "c4c5e3de-c0c9-4091-b242-ceb331004dfd";

    fn id(raw: &str) -> EntityId {
        EntityId::new(Uuid::parse_str(raw).unwrap())
    }

    pub fn some_film_id() -> EntityId {
        id(SOME_FILM_ID)
    }

    pub fn western_genre_id() -> EntityId {
        id(WESTERN_GENRE_ID)
    }

    pub fn some_person_id() -> EntityId {
        id(SOME_PERSON_ID)
    }

    /// "Some film", rated 5.5, a western.
    pub fn some_film() -> Film {
        Film {
            id: some_film_id(),
            title: "Some film".to_string(),
            imdb_rating: Some(5.5),
            description: Some("Some description".to_string()),
            genres: vec![RelatedRef::new(western_genre_id(), "Western")],
            actors: vec![RelatedRef::new(some_person_id(), "Some Actor")],
            writers: Vec::new(),
        }
    }

    /// A second western, rated higher.
    pub fn other_film() -> Film {
        Film {
            id: id(OTHER_FILM_ID),
            title: "Other story".to_string(),
            imdb_rating: Some(7.9),
            description: None,
            genres: vec![RelatedRef::new(western_genre_id(), "Western")],
            actors: Vec::new(),
            writers: vec![RelatedRef::new(some_person_id(), "Some Actor")],
        }
    }

    /// "Western", holding both films.
    pub fn western_genre() -> Genre {
        Genre {
            id: western_genre_id(),
            name: "Western".to_string(),
            description: Some("Cowboys and horses".to_string()),
            films: vec![
                RelatedRef::new(some_film_id(), "Some film"),
                RelatedRef::new(id(OTHER_FILM_ID), "Other story"),
            ],
        }
    }

    pub fn some_person() -> Person {
        Person {
            id: some_person_id(),
            full_name: "Some Actor".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1961, 4, 12),
            films: vec![
                RelatedRef::new(some_film_id(), "Some film"),
                RelatedRef::new(id(OTHER_FILM_ID), "Other story"),
            ],
        }
    }
}

// ============================================================================
// IN-MEMORY STACK
// ============================================================================

/// In-memory cache and search backends, shared through `Arc` so tests can
/// keep poking at them after handing them to services.
pub struct InMemoryStack {
    pub cache: Arc<InMemoryCacheBackend>,
    pub search: Arc<InMemorySearchBackend>,
}

impl Default for InMemoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStack {
    /// Empty cache, no indices.
    pub fn new() -> Self {
        Self {
            cache: Arc::new(InMemoryCacheBackend::new()),
            search: Arc::new(InMemorySearchBackend::new()),
        }
    }

    /// All three indices created and filled with the fixtures.
    pub fn seeded() -> Self {
        let stack = Self::new();
        for kind in EntityKind::ALL {
            stack.search.create_index(&kind.profile().index);
        }
        stack.index_film(&fixtures::some_film());
        stack.index_film(&fixtures::other_film());
        stack.index_genre(&fixtures::western_genre());
        stack.index_person(&fixtures::some_person());
        stack
    }

    pub fn index_film(&self, film: &Film) {
        self.search
            .insert_record(&EntityKind::Movie.profile().index, film);
    }

    pub fn index_genre(&self, genre: &Genre) {
        self.search
            .insert_record(&EntityKind::Genre.profile().index, genre);
    }

    pub fn index_person(&self, person: &Person) {
        self.search
            .insert_record(&EntityKind::Person.profile().index, person);
    }

    /// Read-through cache over this stack's store with default settings.
    pub fn read_through(&self) -> ReadThroughCache<InMemoryCacheBackend> {
        ReadThroughCache::with_defaults(Arc::clone(&self.cache))
    }

    pub fn read_through_with(&self, config: CacheConfig) -> ReadThroughCache<InMemoryCacheBackend> {
        ReadThroughCache::new(Arc::clone(&self.cache), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_seeded_stack_has_all_indices() {
        let stack = InMemoryStack::seeded();
        assert_eq!(stack.search.document_count("movies"), 2);
        assert_eq!(stack.search.document_count("genres"), 1);
        assert_eq!(stack.search.document_count("persons"), 1);
        assert!(stack.cache.is_empty());
    }

    #[test]
    fn test_fixture_ids() {
        assert_eq!(fixtures::some_film().id.to_string(), fixtures::SOME_FILM_ID);
        assert_eq!(fixtures::western_genre().films.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_generated_specs_are_valid(spec in generators::arb_query_spec()) {
            prop_assert!(spec.page_number() >= 1);
            prop_assert!(spec.page_size() >= 1);
            prop_assert!(spec.text_filter().map_or(true, |t| !t.trim().is_empty()));
        }
    }
}
