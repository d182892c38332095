//! TTL Policy Module
//!
//! Maps a content kind to a time-to-live, sourced from configuration with a
//! hard-coded fallback. The policy alone decides defaults; the store honors
//! exactly the TTL it is handed, including the no-expiry sentinel.

use std::collections::HashMap;

use crate::cache::key::ContentKind;
use crate::config::Config;

/// Global fallback TTL for kinds without a configured entry, in seconds.
pub const DEFAULT_TTL: u64 = 3_600;

/// TTL value meaning "no expiry". Distinct from "use the default".
pub const NO_EXPIRY: u64 = 0;

// == TTL Policy ==
/// Per-kind TTL table with a global default.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    table: HashMap<ContentKind, u64>,
    default: u64,
}

impl TtlPolicy {
    // == Constructor ==
    /// Builds the policy from configuration.
    ///
    /// Product-derived kinds share the product TTL; term-like kinds share the
    /// category TTL; customer data lives as long as the session that owns it.
    pub fn from_config(config: &Config) -> Self {
        let mut table = HashMap::new();
        table.insert(ContentKind::Product, config.product_ttl);
        table.insert(ContentKind::ProductPrice, config.product_ttl);
        table.insert(ContentKind::ProductCategories, config.category_ttl);
        table.insert(ContentKind::ProductQuery, config.product_ttl);
        table.insert(ContentKind::Category, config.category_ttl);
        table.insert(ContentKind::Tag, config.category_ttl);
        table.insert(ContentKind::Terms, config.category_ttl);
        table.insert(ContentKind::Cart, config.cart_ttl);
        table.insert(ContentKind::Session, config.session_ttl);
        table.insert(ContentKind::Customer, config.session_ttl);
        table.insert(ContentKind::Transient, config.transient_ttl);

        Self {
            table,
            default: DEFAULT_TTL,
        }
    }

    // == Lookup ==
    /// Returns the configured TTL for a kind, or the global default when the
    /// kind is unmapped. Always a usable value; there is no error path.
    pub fn ttl_for(&self, kind: ContentKind) -> u64 {
        self.table.get(&kind).copied().unwrap_or(self.default)
    }

    // == Resolve ==
    /// Resolves the effective TTL for a write.
    ///
    /// A caller-supplied value wins outright, including an explicit
    /// [`NO_EXPIRY`]: some values carry their own expiry and the policy must
    /// not second-guess them. `None` asks the policy table.
    pub fn resolve(&self, kind: ContentKind, requested: Option<u64>) -> u64 {
        match requested {
            Some(explicit) => explicit,
            None => self.ttl_for(kind),
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
