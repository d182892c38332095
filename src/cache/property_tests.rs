//! Property-Based Tests for the Cache Core
//!
//! Uses proptest to verify key determinism, TTL fallback, stats accounting,
//! and invalidation-plan scoping across arbitrary inputs.

use proptest::prelude::*;
use std::sync::Arc;

use crate::cache::{
    CacheStats, ChangeEvent, ContentKind, Identifier, InvalidationEngine, KeyBuilder, RedisStore,
    TtlPolicy, DEFAULT_TTL,
};
use crate::config::Config;

// == Strategies ==
/// Natural-number ids up to a trillion, well past any real catalog.
fn id_strategy() -> impl Strategy<Value = u64> {
    0u64..1_000_000_000_000
}

fn kind_strategy() -> impl Strategy<Value = ContentKind> {
    prop_oneof![
        Just(ContentKind::Product),
        Just(ContentKind::ProductPrice),
        Just(ContentKind::ProductQuery),
        Just(ContentKind::Category),
        Just(ContentKind::Tag),
        Just(ContentKind::Session),
        Just(ContentKind::Transient),
        Just(ContentKind::Order),
        Just(ContentKind::Coupon),
        Just(ContentKind::Report),
    ]
}

/// Recorded get outcomes for stats accounting.
#[derive(Debug, Clone)]
enum GetOutcome {
    Hit,
    Miss,
}

fn outcome_strategy() -> impl Strategy<Value = GetOutcome> {
    prop_oneof![Just(GetOutcome::Hit), Just(GetOutcome::Miss)]
}

fn engine_for(version: u32, tenant: u64) -> InvalidationEngine {
    InvalidationEngine::new(
        KeyBuilder::new(version, tenant),
        Arc::new(RedisStore::new(&Config::default())),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Building the same (version, tenant, kind, id) tuple twice always yields
    // the same string; keys are pure values.
    #[test]
    fn prop_key_determinism(
        version in 0u32..100,
        tenant in 1u64..10_000,
        kind in kind_strategy(),
        id in id_strategy()
    ) {
        let keys = KeyBuilder::new(version, tenant);
        let a = keys.key(kind, &Identifier::Numeric(id));
        let b = keys.key(kind, &Identifier::Numeric(id));
        prop_assert_eq!(a, b);
    }

    // Distinct natural-number ids never collide within a kind.
    #[test]
    fn prop_distinct_ids_never_collide(
        kind in kind_strategy(),
        a in id_strategy(),
        b in id_strategy()
    ) {
        prop_assume!(a != b);
        let keys = KeyBuilder::new(1, 1);
        prop_assert_ne!(
            keys.key(kind, &Identifier::Numeric(a)),
            keys.key(kind, &Identifier::Numeric(b))
        );
    }

    // Every key lands inside its builder's version+tenant prefix, so pattern
    // operations scoped to that prefix can always find it.
    #[test]
    fn prop_keys_stay_in_namespace(
        version in 0u32..100,
        tenant in 1u64..10_000,
        kind in kind_strategy(),
        id in id_strategy()
    ) {
        let keys = KeyBuilder::new(version, tenant);
        let key = keys.key(kind, &Identifier::Numeric(id));
        let prefix = format!("store:v{}:{}:", version, tenant);
        prop_assert!(key.starts_with(&prefix), "key {} outside {}", key, prefix);
    }

    // Digest identifiers ignore parameter order.
    #[test]
    fn prop_digest_order_independent(
        pairs in prop::collection::btree_map("[a-z]{1,8}", 0i64..1000, 1..6)
    ) {
        let forward: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(*v)))
            .collect();
        let reverse: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(*v)))
            .collect();

        prop_assert_eq!(
            Identifier::digest(&forward),
            Identifier::digest(&reverse)
        );
    }

    // Unmapped kinds always resolve to the global default, whatever the
    // configured table holds.
    #[test]
    fn prop_ttl_fallback(
        product_ttl in 1u64..1_000_000,
        category_ttl in 1u64..1_000_000,
        session_ttl in 1u64..1_000_000
    ) {
        let config = Config {
            product_ttl,
            category_ttl,
            session_ttl,
            ..Config::default()
        };
        let policy = TtlPolicy::from_config(&config);
        prop_assert_eq!(policy.ttl_for(ContentKind::Report), DEFAULT_TTL);
        prop_assert_eq!(policy.ttl_for(ContentKind::Page), DEFAULT_TTL);
    }

    // An explicit TTL always wins over the table, including zero.
    #[test]
    fn prop_ttl_explicit_wins(
        kind in kind_strategy(),
        requested in 0u64..1_000_000
    ) {
        let policy = TtlPolicy::default();
        prop_assert_eq!(policy.resolve(kind, Some(requested)), requested);
    }

    // Counters reflect exactly the operations recorded, and the ratio stays
    // a valid two-decimal percentage.
    #[test]
    fn prop_stats_accuracy(outcomes in prop::collection::vec(outcome_strategy(), 1..200)) {
        let stats = CacheStats::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for outcome in &outcomes {
            match outcome {
                GetOutcome::Hit => {
                    stats.record_hit();
                    expected_hits += 1;
                }
                GetOutcome::Miss => {
                    stats.record_miss();
                    expected_misses += 1;
                }
            }
        }

        let snapshot = stats.snapshot();
        prop_assert_eq!(snapshot.hits, expected_hits);
        prop_assert_eq!(snapshot.misses, expected_misses);
        prop_assert!(snapshot.hit_ratio >= 0.0 && snapshot.hit_ratio <= 100.0);
    }

    // Whatever the event, a plan never reaches outside its tenant namespace.
    #[test]
    fn prop_plans_stay_in_tenant(
        version in 0u32..100,
        tenant in 1u64..10_000,
        id in id_strategy()
    ) {
        let engine = engine_for(version, tenant);
        let prefix = format!("store:v{}:{}:", version, tenant);

        let events = [
            ChangeEvent::ProductUpdated { id },
            ChangeEvent::CategoryChanged { id },
            ChangeEvent::OrderChanged {
                id,
                old_status: None,
                new_status: Some("completed".to_string()),
            },
            ChangeEvent::SettingsChanged,
        ];

        for event in &events {
            let plan = engine.plan(event);
            for key in &plan.keys {
                prop_assert!(key.starts_with(&prefix), "key {} outside {}", key, prefix);
            }
            for pattern in &plan.patterns {
                prop_assert!(
                    pattern.starts_with(&prefix),
                    "pattern {} outside {}",
                    pattern,
                    prefix
                );
            }
        }
    }

    // A product change always invalidates the product's own key and the
    // query-result namespace.
    #[test]
    fn prop_product_plan_complete(id in id_strategy()) {
        let engine = engine_for(1, 1);
        let plan = engine.plan(&ChangeEvent::ProductUpdated { id });

        let own_key = format!("store:v1:1:product:{}", id);
        prop_assert!(plan.keys.contains(&own_key));
        prop_assert!(plan
            .patterns
            .contains(&"store:v1:1:product_query:*".to_string()));
    }
}
