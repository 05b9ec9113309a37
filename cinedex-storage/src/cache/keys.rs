//! Cache key derivation.
//!
//! Keys are plain strings so any KV store can hold them. A single-record key
//! is `"{kind}:{id}"`. A listing key is `"{kind}:list:"` followed by a JSON
//! array of the normalized query fields in a fixed order:
//!
//! ```text
//! movie:list:["0b105f87-...",null,"imdb_rating",true,1,50]
//!            related        text  sort field   desc  page size
//! ```
//!
//! JSON quoting keeps user text containing `:` or `,` from running into the
//! neighbouring fields, and `null` stands for an absent value.

use std::fmt;

use cinedex_core::{EntityId, EntityKind, QuerySpec};

/// Opaque cache key.
///
/// Construction goes through [`CacheKeyBuilder`] so every key in the store
/// follows the same layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds cache keys for records and listings.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Key for one full record.
    pub fn record(kind: EntityKind, id: EntityId) -> CacheKey {
        CacheKey(format!("{}:{}", kind.as_str(), id))
    }

    /// Key for one listing page.
    ///
    /// Two specs produce the same key exactly when they compare equal.
    pub fn listing(kind: EntityKind, spec: &QuerySpec) -> CacheKey {
        let fields = serde_json::json!([
            spec.related_filter().map(|id| id.to_string()),
            spec.text_filter(),
            spec.sort_field(),
            spec.sort_descending(),
            spec.page_number(),
            spec.page_size(),
        ]);
        CacheKey(format!("{}:list:{}", kind.as_str(), fields))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn film_id() -> EntityId {
        EntityId::new(Uuid::parse_str("bb74a838-584e-11ec-9885-c13c488d29c0").unwrap())
    }

    #[test]
    fn test_record_key_format() {
        let key = CacheKeyBuilder::record(EntityKind::Movie, film_id());
        assert_eq!(key.as_str(), "movie:bb74a838-584e-11ec-9885-c13c488d29c0");

        let genre = CacheKeyBuilder::record(EntityKind::Genre, film_id());
        assert_ne!(key, genre);
        assert!(genre.as_str().starts_with("genre:"));
    }

    #[test]
    fn test_listing_key_format() {
        let spec = QuerySpec::builder()
            .related(film_id())
            .sort("-imdb_rating")
            .page_number(2)
            .page_size(50)
            .build()
            .unwrap();
        let key = CacheKeyBuilder::listing(EntityKind::Movie, &spec);
        assert_eq!(
            key.as_str(),
            r#"movie:list:["bb74a838-584e-11ec-9885-c13c488d29c0",null,"imdb_rating",true,2,50]"#
        );
    }

    #[test]
    fn test_listing_default_key() {
        let key = CacheKeyBuilder::listing(EntityKind::Genre, &QuerySpec::default());
        assert_eq!(key.as_str(), "genre:list:[null,null,null,false,1,9999]");
    }

    #[test]
    fn test_listing_key_never_collides_with_record_key() {
        let record = CacheKeyBuilder::record(EntityKind::Person, film_id());
        let listing = CacheKeyBuilder::listing(EntityKind::Person, &QuerySpec::default());
        assert_ne!(record, listing);
    }

    #[test]
    fn test_separator_in_text_does_not_shift_fields() {
        let tricky = QuerySpec::builder()
            .text(r#"a",null,"b"#)
            .build()
            .unwrap();
        let plain = QuerySpec::builder().text("a").sort("b").build().unwrap();
        assert_ne!(
            CacheKeyBuilder::listing(EntityKind::Movie, &tricky),
            CacheKeyBuilder::listing(EntityKind::Movie, &plain)
        );
    }

    #[test]
    fn test_blank_and_missing_text_share_a_key() {
        let blank = QuerySpec::builder().text("  ").build().unwrap();
        assert_eq!(
            CacheKeyBuilder::listing(EntityKind::Movie, &blank),
            CacheKeyBuilder::listing(EntityKind::Movie, &QuerySpec::default())
        );
    }

    #[test]
    fn test_each_field_changes_the_key() {
        let base = QuerySpec::builder().page_size(10).build().unwrap();
        let variants = [
            QuerySpec::builder().page_size(10).related(film_id()).build().unwrap(),
            QuerySpec::builder().page_size(10).text("west").build().unwrap(),
            QuerySpec::builder().page_size(10).sort("title").build().unwrap(),
            QuerySpec::builder().page_size(10).sort("-title").build().unwrap(),
            QuerySpec::builder().page_size(10).page_number(2).build().unwrap(),
            QuerySpec::builder().page_size(11).build().unwrap(),
        ];

        let base_key = CacheKeyBuilder::listing(EntityKind::Movie, &base);
        for variant in &variants {
            assert_ne!(CacheKeyBuilder::listing(EntityKind::Movie, variant), base_key);
        }
    }

    fn arb_spec() -> impl Strategy<Value = QuerySpec> {
        (
            proptest::option::of(any::<u128>()),
            proptest::option::of("[a-z :,\"]{0,8}"),
            proptest::option::of("-?[a-z_]{1,6}"),
            1u32..5,
            1u32..5,
        )
            .prop_map(|(related, text, sort, page_number, page_size)| {
                QuerySpec::builder()
                    .related_opt(related.map(|bits| EntityId::new(Uuid::from_u128(bits))))
                    .text_opt(text)
                    .sort_opt(sort)
                    .page_number(page_number)
                    .page_size(page_size)
                    .build()
                    .unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_listing_key_is_injective(a in arb_spec(), b in arb_spec()) {
            let key_a = CacheKeyBuilder::listing(EntityKind::Movie, &a);
            let key_b = CacheKeyBuilder::listing(EntityKind::Movie, &b);
            prop_assert_eq!(a == b, key_a == key_b);
        }

        #[test]
        fn prop_listing_key_is_deterministic(spec in arb_spec()) {
            let again = spec.clone();
            prop_assert_eq!(
                CacheKeyBuilder::listing(EntityKind::Genre, &spec),
                CacheKeyBuilder::listing(EntityKind::Genre, &again)
            );
        }
    }
}
