//! Cache Invalidation Module
//!
//! Translates domain change notifications into targeted key deletes and
//! pattern-based bulk deletes. The translation itself is pure (see
//! [`InvalidationEngine::plan`]); execution is a fixed sequence of store
//! calls.
//!
//! Query-result and terms caches are keyed by parameter digests, so the exact
//! set of affected keys cannot be computed from a single entity change; those
//! namespaces are invalidated wholesale on any change that could affect them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::key::{ContentKind, Identifier, KeyBuilder};
use crate::cache::store::RedisStore;

/// Transient names cleared whenever product content changes.
const PRODUCT_TRANSIENTS: &[&str] = &["products_onsale", "featured_products", "term_counts"];

/// Transient names cleared whenever shop settings change.
const SETTINGS_TRANSIENTS: &[&str] = &[
    "term_counts",
    "shipping_method_count",
    "attribute_taxonomies",
];

// == Change Event ==
/// A structured domain change notification.
///
/// The event layer resolves entities to plain ids before building one of
/// these; in particular a variation event already carries its parent's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An existing product was updated, restocked, repriced, or deleted.
    ProductUpdated { id: u64 },
    /// A new product was created.
    ProductCreated { id: u64 },
    /// A product variation changed; invalidates the parent as well.
    VariationUpdated { id: u64, parent_id: u64 },
    /// A product category was created, edited, or deleted.
    CategoryChanged { id: u64 },
    /// A product tag was created, edited, or deleted.
    TagChanged { id: u64 },
    /// An order changed, possibly moving between statuses.
    OrderChanged {
        id: u64,
        #[serde(default)]
        old_status: Option<String>,
        #[serde(default)]
        new_status: Option<String>,
    },
    /// A coupon was created, edited, or deleted.
    CouponChanged { id: u64 },
    /// Global shop settings were saved.
    SettingsChanged,
}

impl ChangeEvent {
    /// The id of the entity this event is about, when it has one.
    pub fn entity_id(&self) -> Option<u64> {
        match self {
            ChangeEvent::ProductUpdated { id }
            | ChangeEvent::ProductCreated { id }
            | ChangeEvent::VariationUpdated { id, .. }
            | ChangeEvent::CategoryChanged { id }
            | ChangeEvent::TagChanged { id }
            | ChangeEvent::OrderChanged { id, .. }
            | ChangeEvent::CouponChanged { id } => Some(*id),
            ChangeEvent::SettingsChanged => None,
        }
    }
}

// == Invalidation Plan ==
/// The exact keys and patterns one event resolves to, before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    /// Keys deleted individually
    pub keys: Vec<String>,
    /// Glob patterns deleted in bulk
    pub patterns: Vec<String>,
}

impl InvalidationPlan {
    fn key(&mut self, key: String) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    fn pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}

// == Invalidation Engine ==
/// Stateless translator from change events to store deletions.
#[derive(Debug, Clone)]
pub struct InvalidationEngine {
    keys: KeyBuilder,
    store: Arc<RedisStore>,
}

impl InvalidationEngine {
    // == Constructor ==
    pub fn new(keys: KeyBuilder, store: Arc<RedisStore>) -> Self {
        Self { keys, store }
    }

    // == Plan ==
    /// Resolves an event to the keys and patterns it invalidates.
    ///
    /// Pure: no store access, no side effects. Duplicate keys and patterns
    /// are collapsed so events composed from smaller ones (variation,
    /// creation) execute each deletion once.
    pub fn plan(&self, event: &ChangeEvent) -> InvalidationPlan {
        let mut plan = InvalidationPlan::default();
        self.extend_plan(&mut plan, event);
        plan
    }

    fn extend_plan(&self, plan: &mut InvalidationPlan, event: &ChangeEvent) {
        match event {
            ChangeEvent::ProductUpdated { id } | ChangeEvent::ProductCreated { id } => {
                self.product_entries(plan, *id);
            }
            ChangeEvent::VariationUpdated { id, parent_id } => {
                self.product_entries(plan, *parent_id);
                self.product_entries(plan, *id);
            }
            ChangeEvent::CategoryChanged { id } => {
                plan.key(self.keys.key(ContentKind::Category, &Identifier::Numeric(*id)));
                plan.pattern(self.keys.kind_pattern(ContentKind::Terms));
                plan.pattern(self.keys.kind_pattern(ContentKind::ProductQuery));
            }
            ChangeEvent::TagChanged { id } => {
                plan.key(self.keys.key(ContentKind::Tag, &Identifier::Numeric(*id)));
                plan.pattern(self.keys.kind_pattern(ContentKind::Terms));
                plan.pattern(self.keys.kind_pattern(ContentKind::ProductQuery));
            }
            ChangeEvent::OrderChanged {
                id,
                old_status,
                new_status,
            } => {
                plan.key(self.keys.key(ContentKind::Order, &Identifier::Numeric(*id)));
                // Report aggregates only shift when an order actually moves
                // between statuses.
                if old_status != new_status && new_status.is_some() {
                    plan.pattern(self.keys.kind_pattern(ContentKind::Report));
                }
            }
            ChangeEvent::CouponChanged { id } => {
                plan.key(self.keys.key(ContentKind::Coupon, &Identifier::Numeric(*id)));
            }
            ChangeEvent::SettingsChanged => {
                for name in SETTINGS_TRANSIENTS {
                    plan.key(
                        self.keys
                            .key(ContentKind::Transient, &Identifier::from(*name)),
                    );
                }
            }
        }
    }

    /// Everything a single product id owns, plus the namespaces its change
    /// could have skewed.
    fn product_entries(&self, plan: &mut InvalidationPlan, id: u64) {
        let id = Identifier::Numeric(id);
        plan.key(self.keys.key(ContentKind::Product, &id));
        plan.key(self.keys.key(ContentKind::ProductPrice, &id));
        plan.key(self.keys.key(ContentKind::ProductCategories, &id));
        plan.pattern(self.keys.kind_pattern(ContentKind::ProductQuery));
        for name in PRODUCT_TRANSIENTS {
            plan.key(
                self.keys
                    .key(ContentKind::Transient, &Identifier::from(*name)),
            );
        }
    }

    // == Handle ==
    /// Executes the plan for one event against the store.
    ///
    /// Returns the number of keys actually removed. Fail-soft like the store
    /// itself: a disconnected backend just removes nothing.
    pub async fn handle(&self, event: &ChangeEvent) -> u64 {
        let plan = self.plan(event);
        let mut removed: u64 = 0;

        for key in &plan.keys {
            if self.store.delete(key).await {
                removed += 1;
            }
        }
        for pattern in &plan.patterns {
            removed += self.store.delete_by_pattern(pattern).await;
        }

        info!(?event, removed, "invalidated cache entries");
        debug!(keys = plan.keys.len(), patterns = plan.patterns.len(), "invalidation plan executed");
        removed
    }
}
