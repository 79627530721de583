use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use regex::RegexBuilder;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{parse_numeric_key, DocumentId, DocumentStore, RawDocument, StoreError};

#[derive(Debug, Default)]
struct Collection {
    last_key: u64,
    docs: BTreeMap<u64, Value>,
}

impl Collection {
    fn matching(&self, mut predicate: impl FnMut(&Value) -> bool) -> Vec<RawDocument> {
        self.docs
            .iter()
            .filter(|(_, doc)| predicate(doc))
            .map(|(key, doc)| RawDocument {
                id: to_id(*key),
                doc: doc.clone(),
            })
            .collect()
    }
}

fn to_id(key: u64) -> DocumentId {
    DocumentId::from(key.to_string())
}

/// Text at a dotted path, if the path leads to a string.
fn text_at<'a>(doc: &'a Value, field: &str) -> Option<&'a str> {
    field
        .split('.')
        .try_fold(doc, |value, segment| value.get(segment))
        .and_then(Value::as_str)
}

/// In-process backend. Keys count up from 1 per collection and are never
/// reused; documents iterate in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new(collections: &[&str]) -> Self {
        let collections = collections
            .iter()
            .map(|name| (name.to_string(), Collection::default()))
            .collect();
        Self {
            collections: RwLock::new(collections),
        }
    }

    async fn read<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&Collection) -> T,
    ) -> Result<T, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(f)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    async fn write<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Collection) -> T,
    ) -> Result<T, StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .map(f)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<DocumentId, StoreError> {
        self.write(collection, |c| {
            c.last_key += 1;
            c.docs.insert(c.last_key, doc);
            to_id(c.last_key)
        })
        .await
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError> {
        let key = parse_numeric_key(id);
        if key.is_none() {
            debug!("Malformed identifier '{}' in {}", id, collection);
        }
        self.read(collection, |c| key.and_then(|k| c.docs.get(&k).cloned()))
            .await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        self.read(collection, |c| c.matching(|_| true)).await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<RawDocument>, StoreError> {
        self.read(collection, |c| {
            c.matching(|doc| text_at(doc, field) == Some(value))
        })
        .await
    }

    async fn search(
        &self,
        collection: &str,
        fields: &[&str],
        query: &str,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()?;

        self.read(collection, |c| {
            c.matching(|doc| {
                fields
                    .iter()
                    .filter_map(|field| text_at(doc, field))
                    .any(|text| pattern.is_match(text))
            })
        })
        .await
    }

    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        expected: &Value,
        doc: Value,
    ) -> Result<bool, StoreError> {
        let Some(key) = parse_numeric_key(id) else {
            return Ok(false);
        };
        self.write(collection, |c| match c.docs.get_mut(&key) {
            Some(slot) if *slot == *expected => {
                *slot = doc;
                true
            }
            _ => false,
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let Some(key) = parse_numeric_key(id) else {
            return Ok(false);
        };
        self.write(collection, |c| c.docs.remove(&key).is_some())
            .await
    }

    async fn close(&self) {
        debug!("Closing in-memory document store");
    }
}
