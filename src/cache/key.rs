//! Cache Key Module
//!
//! Deterministic construction of fully-qualified cache keys. Every key is
//! `store:v{schema}:{tenant}:{kind}:{id}`; the version and tenant segments
//! isolate schema upgrades and multi-tenant deployments from each other, and
//! give bulk pattern operations a safe prefix to scope to.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Fixed root segment of every key this crate writes.
pub const ROOT_NAMESPACE: &str = "store";

/// Digest identifiers keep the first 32 hex chars of the SHA-256.
const DIGEST_LEN: usize = 32;

// == Content Kind ==
/// Classifies what kind of domain object a cache entry represents.
///
/// The vocabulary is conventionally fixed: bulk invalidation patterns are
/// built per kind, so a new kind only needs a new variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Product,
    ProductPrice,
    ProductCategories,
    ProductQuery,
    Category,
    Tag,
    Terms,
    Session,
    Transient,
    Order,
    Coupon,
    Customer,
    Cart,
    Page,
    Report,
}

impl ContentKind {
    /// The key segment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Product => "product",
            ContentKind::ProductPrice => "product_price",
            ContentKind::ProductCategories => "product_categories",
            ContentKind::ProductQuery => "product_query",
            ContentKind::Category => "category",
            ContentKind::Tag => "tag",
            ContentKind::Terms => "terms",
            ContentKind::Session => "session",
            ContentKind::Transient => "transient",
            ContentKind::Order => "order",
            ContentKind::Coupon => "coupon",
            ContentKind::Customer => "customer",
            ContentKind::Cart => "cart",
            ContentKind::Page => "page",
            ContentKind::Report => "report",
        }
    }

    /// Parses a key segment back into a kind.
    pub fn parse(segment: &str) -> Option<Self> {
        Some(match segment {
            "product" => ContentKind::Product,
            "product_price" => ContentKind::ProductPrice,
            "product_categories" => ContentKind::ProductCategories,
            "product_query" => ContentKind::ProductQuery,
            "category" => ContentKind::Category,
            "tag" => ContentKind::Tag,
            "terms" => ContentKind::Terms,
            "session" => ContentKind::Session,
            "transient" => ContentKind::Transient,
            "order" => ContentKind::Order,
            "coupon" => ContentKind::Coupon,
            "customer" => ContentKind::Customer,
            "cart" => ContentKind::Cart,
            "page" => ContentKind::Page,
            "report" => ContentKind::Report,
            _ => return None,
        })
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Identifier ==
/// The trailing segment of a key, in canonical string form.
///
/// Numeric ids render as decimal, free-form strings verbatim, and composite
/// query parameters as a deterministic hash of their canonically-ordered
/// serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Numeric(u64),
    Text(String),
    Digest(String),
}

impl Identifier {
    /// Builds a digest identifier from arbitrary serializable parameters.
    ///
    /// The parameters are rendered through `serde_json::Value`, whose map
    /// keys are lexicographically ordered, so two structurally equal inputs
    /// always hash identically regardless of field insertion order.
    pub fn digest<T: Serialize>(params: &T) -> Self {
        let canonical = serde_json::to_value(params)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let hash = Sha256::digest(canonical.as_bytes());
        let mut hex = hex::encode(hash);
        hex.truncate(DIGEST_LEN);
        Identifier::Digest(hex)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(id) => write!(f, "{}", id),
            Identifier::Text(s) => f.write_str(s),
            Identifier::Digest(d) => f.write_str(d),
        }
    }
}

impl From<u64> for Identifier {
    fn from(id: u64) -> Self {
        Identifier::Numeric(id)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Text(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Text(s)
    }
}

// == Key Builder ==
/// Pure key constructor for one (schema version, tenant) pair.
///
/// Keys built from the same (tenant, kind, id) tuple at the same schema
/// version are always identical; there is no hidden state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBuilder {
    schema_version: u32,
    tenant: u64,
}

impl KeyBuilder {
    // == Constructor ==
    /// Creates a builder for the given schema version and tenant.
    pub fn new(schema_version: u32, tenant: u64) -> Self {
        Self {
            schema_version,
            tenant,
        }
    }

    /// Creates a builder from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.schema_version, config.tenant)
    }

    /// The schema version this builder stamps into keys.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// The tenant this builder stamps into keys.
    pub fn tenant(&self) -> u64 {
        self.tenant
    }

    // == Key ==
    /// Builds the fully-qualified key for a (kind, identifier) pair.
    pub fn key(&self, kind: ContentKind, id: &Identifier) -> String {
        format!(
            "{}:v{}:{}:{}:{}",
            ROOT_NAMESPACE, self.schema_version, self.tenant, kind, id
        )
    }

    // == Patterns ==
    /// Glob matching every key of one kind at the current version and tenant.
    pub fn kind_pattern(&self, kind: ContentKind) -> String {
        format!(
            "{}:v{}:{}:{}:*",
            ROOT_NAMESPACE, self.schema_version, self.tenant, kind
        )
    }

    /// Glob matching every key for this tenant across all schema versions.
    ///
    /// Used for whole-namespace flushes, where entries written under older
    /// versions must go too.
    pub fn namespace_pattern(&self) -> String {
        format!("{}:*:{}:*", ROOT_NAMESPACE, self.tenant)
    }

    /// Glob matching every key for this tenant under a specific schema
    /// version, typically an old one left behind by a rolling upgrade.
    pub fn version_pattern(&self, version: u32) -> String {
        format!("{}:v{}:{}:*", ROOT_NAMESPACE, version, self.tenant)
    }
}
