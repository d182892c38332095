//! Request DTOs for the ops API
//!
//! Defines the structure of incoming HTTP request bodies. Identifiers arrive
//! as strings; decimal ids become numeric identifiers, everything else stays
//! free-form text.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{ContentKind, Identifier};

/// Longest accepted identifier, in bytes.
const MAX_ID_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// Content kind of the entry
    pub kind: ContentKind,
    /// Identifier within the kind
    pub id: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds; 0 stores without expiry, absent asks the policy
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_id(&self.id)
    }

    /// The identifier this request addresses.
    pub fn identifier(&self) -> Identifier {
        parse_identifier(&self.id)
    }
}

/// One (kind, id) address in a bulk request
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRef {
    pub kind: ContentKind,
    pub id: String,
}

impl KeyRef {
    pub fn identifier(&self) -> Identifier {
        parse_identifier(&self.id)
    }
}

/// Request body for the bulk read operation (POST /mget)
#[derive(Debug, Clone, Deserialize)]
pub struct MultiGetRequest {
    pub entries: Vec<KeyRef>,
}

/// One entry of a bulk write
#[derive(Debug, Clone, Deserialize)]
pub struct WarmEntry {
    pub kind: ContentKind,
    pub id: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl WarmEntry {
    pub fn identifier(&self) -> Identifier {
        parse_identifier(&self.id)
    }
}

/// Request body for the bulk write operation (POST /warm)
#[derive(Debug, Clone, Deserialize)]
pub struct WarmRequest {
    pub entries: Vec<WarmEntry>,
}

impl WarmRequest {
    /// Validates every entry, returning the first problem found.
    pub fn validate(&self) -> Option<String> {
        if self.entries.is_empty() {
            return Some("Batch cannot be empty".to_string());
        }
        self.entries.iter().find_map(|e| validate_id(&e.id))
    }
}

/// Decimal strings address numeric ids; everything else is free-form text.
pub fn parse_identifier(id: &str) -> Identifier {
    match id.parse::<u64>() {
        Ok(numeric) => Identifier::Numeric(numeric),
        Err(_) => Identifier::Text(id.to_string()),
    }
}

fn validate_id(id: &str) -> Option<String> {
    if id.is_empty() {
        return Some("Id cannot be empty".to_string());
    }
    if id.len() > MAX_ID_LENGTH {
        return Some(format!(
            "Id exceeds maximum length of {} bytes",
            MAX_ID_LENGTH
        ));
    }
    None
}
