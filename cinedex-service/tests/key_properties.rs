//! Property tests for listing normalization and cache keys.

use std::sync::Arc;

use cinedex_core::{EntityKind, QuerySpec};
use cinedex_service::ServiceRegistry;
use cinedex_storage::CacheKeyBuilder;
use cinedex_test_utils::generators::{arb_entity_kind, arb_query_spec, arb_raw_listing};
use cinedex_test_utils::InMemoryStack;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_setter_order_does_not_change_key(
        kind in arb_entity_kind(),
        raw in arb_raw_listing(),
    ) {
        let forward = raw.build_forward();
        let reversed = raw.build_reversed();
        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(
            CacheKeyBuilder::listing(kind, &forward),
            CacheKeyBuilder::listing(kind, &reversed)
        );
    }

    #[test]
    fn prop_listing_keys_are_namespaced_by_kind(spec in arb_query_spec()) {
        let keys: Vec<String> = EntityKind::ALL
            .iter()
            .map(|kind| CacheKeyBuilder::listing(*kind, &spec).into_string())
            .collect();
        for (kind, key) in EntityKind::ALL.iter().zip(&keys) {
            let prefix = format!("{}:list:", kind);
            prop_assert!(key.starts_with(&prefix));
        }
        prop_assert_ne!(&keys[0], &keys[1]);
        prop_assert_ne!(&keys[1], &keys[2]);
    }

    #[test]
    fn prop_offset_is_page_arithmetic(page_number in 1u32..10_000, page_size in 1u32..10_000) {
        let spec = QuerySpec::builder()
            .page_number(page_number)
            .page_size(page_size)
            .build()
            .unwrap();
        prop_assert_eq!(
            spec.offset(),
            u64::from(page_number - 1) * u64::from(page_size)
        );
    }
}

#[test]
fn test_equivalent_requests_share_one_cache_entry() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&arb_raw_listing(), |raw| {
            let stack = InMemoryStack::seeded();
            let registry = ServiceRegistry::new(stack.read_through(), Arc::clone(&stack.search));

            let first = runtime
                .block_on(registry.list(EntityKind::Movie, &raw.build_forward()))
                .unwrap();
            let second = runtime
                .block_on(registry.list(EntityKind::Movie, &raw.build_reversed()))
                .unwrap();

            prop_assert_eq!(first, second);
            prop_assert_eq!(stack.search.call_count(), 1);
            prop_assert_eq!(stack.cache.len(), 1);
            Ok(())
        })
        .unwrap();
}
