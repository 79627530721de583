//! Document storage.
//!
//! A collection holds schemaless JSON documents under store-assigned
//! identifiers. Two backends implement [`DocumentStore`]:
//!
//! - `postgres`: one JSONB table per collection
//! - `memory`: ordered in-process maps, for development and tests

mod memory;
mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub(crate) use postgres::is_sql_identifier;

/// URL scheme selecting the in-memory backend.
pub const MEMORY_URL: &str = "memory://";

/// Opaque identifier of a stored document, as it appears on the wire.
///
/// Only the store that issued an identifier knows how to read it back; an
/// identifier it cannot parse simply resolves to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a decimal key the way both backends format theirs. Signs, padding
/// and zero are rejected so that every key has exactly one spelling.
fn parse_numeric_key(id: &DocumentId) -> Option<u64> {
    let s = id.as_str();
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: DocumentId,
    pub doc: Value,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("invalid schema or collection name '{0}'")]
    InvalidName(String),

    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("stored document {id} in '{collection}' is invalid: {source}")]
    Decode {
        collection: &'static str,
        id: DocumentId,
        #[source]
        source: serde_json::Error,
    },
}

/// Operations a backend offers; each touches at most one document.
///
/// Field paths are dotted (`mode.base.prim`). Results come back in the
/// store's natural order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return the identifier assigned to it.
    async fn insert(&self, collection: &str, doc: Value) -> Result<DocumentId, StoreError>;

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError>;

    async fn find_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError>;

    /// Documents whose text at `field` equals `value` exactly.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<RawDocument>, StoreError>;

    /// Documents where any of `fields` contains `query`, ignoring case.
    /// The query is a literal: pattern characters in it match themselves.
    async fn search(
        &self,
        collection: &str,
        fields: &[&str],
        query: &str,
    ) -> Result<Vec<RawDocument>, StoreError>;

    /// Replace a document wholesale, provided it still equals `expected`.
    /// Returns false when it is gone or was changed in the meantime.
    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        expected: &Value,
        doc: Value,
    ) -> Result<bool, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError>;

    /// Release connections. Called once, after the server stops.
    async fn close(&self);
}

/// Open the backend named by `config.database_url` with the given
/// collections ready for use.
pub async fn connect(
    config: &Config,
    collections: &[&str],
) -> Result<Arc<dyn DocumentStore>, StoreError> {
    if config.database_url.starts_with(MEMORY_URL) {
        info!("Using in-memory document store");
        return Ok(Arc::new(MemoryStore::new(collections)));
    }

    let store = PgStore::connect(
        &config.database_url,
        &config.database_name,
        config.database_max_connections,
        collections,
    )
    .await?;
    Ok(Arc::new(store))
}
