//! Catalog Reindex Task
//!
//! Paged warm-up of the product namespace: fetches the catalog page by page
//! from a pluggable source and writes each item's product and price entries.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{ContentKind, Identifier, KeyBuilder, RedisStore, TtlPolicy};

// == Catalog Source ==
/// One published catalog item, as the integration layer hands it over.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    /// Product id
    pub id: u64,
    /// Full product payload to cache
    pub product: Value,
    /// Display price, cached under its own companion key
    pub price: String,
}

/// Pluggable page-wise catalog reader.
///
/// Pages are 1-based. An empty page means the catalog is exhausted; a short
/// page (fewer than `per_page` items) is the last one.
pub trait CatalogSource {
    fn fetch_page(
        &self,
        page: usize,
        per_page: usize,
    ) -> impl Future<Output = Vec<CatalogItem>> + Send;
}

/// What a reindex run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReindexOutcome {
    /// Number of pages requested from the source
    pub pages_fetched: usize,
    /// Number of catalog items written (each as product + price entry)
    pub items_indexed: u64,
}

// == Reindex ==
/// Warms the product cache from `source`, one page at a time.
///
/// Each item issues two writes: its product entry and its companion price
/// entry, both under the product TTL. The loop stops at the first empty or
/// short page.
pub async fn reindex_products<S: CatalogSource>(
    source: &S,
    store: &RedisStore,
    keys: &KeyBuilder,
    ttl_policy: &TtlPolicy,
    per_page: usize,
) -> ReindexOutcome {
    if per_page == 0 {
        return ReindexOutcome {
            pages_fetched: 0,
            items_indexed: 0,
        };
    }

    let ttl = ttl_policy.ttl_for(ContentKind::Product);
    let mut pages_fetched = 0;
    let mut items_indexed: u64 = 0;
    let mut page = 1;

    loop {
        let items = source.fetch_page(page, per_page).await;
        pages_fetched += 1;
        debug!(page, items = items.len(), "fetched catalog page");

        if items.is_empty() {
            break;
        }
        let last_page = items.len() < per_page;

        for item in &items {
            let id = Identifier::Numeric(item.id);
            store
                .set(&keys.key(ContentKind::Product, &id), &item.product, ttl)
                .await;
            store
                .set(&keys.key(ContentKind::ProductPrice, &id), &item.price, ttl)
                .await;
            items_indexed += 1;
        }

        if last_page {
            break;
        }
        page += 1;
    }

    info!(pages_fetched, items_indexed, "catalog reindex finished");
    ReindexOutcome {
        pages_fetched,
        items_indexed,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory catalog of `total` sequentially-numbered products.
    struct FixedCatalog {
        total: usize,
        fetches: AtomicUsize,
    }

    impl FixedCatalog {
        fn new(total: usize) -> Self {
            Self {
                total,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl CatalogSource for FixedCatalog {
        async fn fetch_page(&self, page: usize, per_page: usize) -> Vec<CatalogItem> {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            let start = (page - 1) * per_page;
            let end = (start + per_page).min(self.total);
            (start..end)
                .map(|i| CatalogItem {
                    id: i as u64 + 1,
                    product: json!({"id": i + 1, "name": format!("item {}", i + 1)}),
                    price: "9.99".to_string(),
                })
                .collect()
        }
    }

    fn fixtures() -> (RedisStore, KeyBuilder, TtlPolicy) {
        let config = Config::default();
        (
            RedisStore::new(&config),
            KeyBuilder::from_config(&config),
            TtlPolicy::from_config(&config),
        )
    }

    #[tokio::test]
    async fn test_reindex_250_items_takes_three_pages() {
        let source = FixedCatalog::new(250);
        let (store, keys, ttl) = fixtures();

        let outcome = reindex_products(&source, &store, &keys, &ttl, 100).await;

        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.items_indexed, 250);
        assert_eq!(source.fetches.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_reindex_exact_multiple_stops_on_empty_page() {
        let source = FixedCatalog::new(200);
        let (store, keys, ttl) = fixtures();

        let outcome = reindex_products(&source, &store, &keys, &ttl, 100).await;

        // Two full pages, then the empty third page ends the loop.
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.items_indexed, 200);
    }

    #[tokio::test]
    async fn test_reindex_empty_catalog() {
        let source = FixedCatalog::new(0);
        let (store, keys, ttl) = fixtures();

        let outcome = reindex_products(&source, &store, &keys, &ttl, 100).await;

        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(outcome.items_indexed, 0);
    }

    #[tokio::test]
    async fn test_reindex_zero_page_size_is_refused() {
        let source = FixedCatalog::new(10);
        let (store, keys, ttl) = fixtures();

        let outcome = reindex_products(&source, &store, &keys, &ttl, 0).await;

        assert_eq!(outcome.pages_fetched, 0);
        assert_eq!(source.fetches.load(Ordering::Relaxed), 0);
    }
}
