//! Background Tasks Module
//!
//! Work that runs outside the request path:
//! - Deferred invalidation: one-shot timers for changes that take effect in
//!   the future (scheduled sale prices).
//! - Catalog reindex: paged warm-up of the product namespace.

mod deferred;
mod reindex;

pub use deferred::DeferredInvalidator;
pub use reindex::{reindex_products, CatalogItem, CatalogSource, ReindexOutcome};
