//! Typed CRUD and search over one document collection per entry kind.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Root, RootPatch, Translation, TranslationPatch, ValidationError};
use crate::store::{DocumentId, DocumentStore, RawDocument, StoreError};

/// Every collection the service uses.
pub const COLLECTIONS: &[&str] = &[Root::COLLECTION, Translation::COLLECTION];

/// An entry kind the repository can persist.
pub trait Entry: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Patch: Clone + Send;

    const COLLECTION: &'static str;

    /// Text fields `search` looks in, as dotted paths.
    const SEARCH_FIELDS: &'static [&'static str];

    fn patch_is_empty(patch: &Self::Patch) -> bool;

    fn apply(self, patch: Self::Patch) -> Result<Self, ValidationError>;
}

impl Entry for Root {
    type Patch = RootPatch;

    const COLLECTION: &'static str = "roots";
    const SEARCH_FIELDS: &'static [&'static str] = &["root", "prim", "mode.base.prim"];

    fn patch_is_empty(patch: &RootPatch) -> bool {
        patch.is_empty()
    }

    fn apply(self, patch: RootPatch) -> Result<Self, ValidationError> {
        Root::apply(self, patch)
    }
}

impl Entry for Translation {
    type Patch = TranslationPatch;

    const COLLECTION: &'static str = "translations";
    const SEARCH_FIELDS: &'static [&'static str] = &["kelma", "english", "root"];

    fn patch_is_empty(patch: &TranslationPatch) -> bool {
        patch.is_empty()
    }

    fn apply(self, patch: TranslationPatch) -> Result<Self, ValidationError> {
        Translation::apply(self, patch)
    }
}

/// An entry with the identifier the store gave it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<E> {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub entry: E,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Repository<E> {
    store: Arc<dyn DocumentStore>,
    _entry: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entry: PhantomData,
        }
    }
}

impl<E: Entry> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entry: PhantomData,
        }
    }

    fn encode(entry: &E) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(entry).map_err(StoreError::Encode)
    }

    fn decode(raw: RawDocument) -> Result<Stored<E>, StoreError> {
        let RawDocument { id, doc } = raw;
        match serde_json::from_value(doc) {
            Ok(entry) => Ok(Stored { id, entry }),
            Err(source) => Err(StoreError::Decode {
                collection: E::COLLECTION,
                id,
                source,
            }),
        }
    }

    fn decode_all(raws: Vec<RawDocument>) -> Result<Vec<Stored<E>>, StoreError> {
        raws.into_iter().map(Self::decode).collect()
    }

    pub async fn insert(&self, entry: E) -> Result<Stored<E>, StoreError> {
        let id = self
            .store
            .insert(E::COLLECTION, Self::encode(&entry)?)
            .await?;
        info!("Inserted {} into {}", id, E::COLLECTION);
        Ok(Stored { id, entry })
    }

    /// `None` for unknown and malformed identifiers alike.
    pub async fn get_by_id(&self, id: &DocumentId) -> Result<Option<Stored<E>>, StoreError> {
        debug!("Fetching {} from {}", id, E::COLLECTION);
        match self.store.find_by_id(E::COLLECTION, id).await? {
            Some(doc) => Self::decode(RawDocument {
                id: id.clone(),
                doc,
            })
            .map(Some),
            None => Ok(None),
        }
    }

    pub async fn list(&self) -> Result<Vec<Stored<E>>, StoreError> {
        Self::decode_all(self.store.find_all(E::COLLECTION).await?)
    }

    /// Apply the non-null fields of `patch`. An empty patch returns the
    /// stored entry untouched; `None` means the identifier did not resolve.
    ///
    /// The write only lands on the document that was read. If another
    /// writer got there first, the patch is re-applied to the fresh copy.
    pub async fn update_partial(
        &self,
        id: &DocumentId,
        patch: E::Patch,
    ) -> Result<Option<Stored<E>>, UpdateError> {
        loop {
            let Some(doc) = self.store.find_by_id(E::COLLECTION, id).await? else {
                return Ok(None);
            };
            let current = Self::decode(RawDocument {
                id: id.clone(),
                doc: doc.clone(),
            })?;
            if E::patch_is_empty(&patch) {
                debug!("Empty patch for {} in {}", id, E::COLLECTION);
                return Ok(Some(current));
            }

            let entry = current.entry.apply(patch.clone())?;
            if self
                .store
                .replace(E::COLLECTION, id, &doc, Self::encode(&entry)?)
                .await?
            {
                info!("Updated {} in {}", id, E::COLLECTION);
                return Ok(Some(Stored {
                    id: id.clone(),
                    entry,
                }));
            }

            debug!("{} in {} changed during update, retrying", id, E::COLLECTION);
        }
    }

    /// Returns whether anything was removed.
    pub async fn delete(&self, id: &DocumentId) -> Result<bool, StoreError> {
        let removed = self.store.delete(E::COLLECTION, id).await?;
        if removed {
            info!("Deleted {} from {}", id, E::COLLECTION);
        }
        Ok(removed)
    }

    /// Case-insensitive substring match over `E::SEARCH_FIELDS`.
    pub async fn search(&self, query: &str) -> Result<Vec<Stored<E>>, StoreError> {
        debug!("Searching {} for '{}'", E::COLLECTION, query);
        Self::decode_all(
            self.store
                .search(E::COLLECTION, E::SEARCH_FIELDS, query)
                .await?,
        )
    }
}

impl Repository<Translation> {
    /// Every translation derived from `root`, matched exactly.
    pub async fn list_by_root(&self, root: &str) -> Result<Vec<Stored<Translation>>, StoreError> {
        Self::decode_all(
            self.store
                .find_by_field(Translation::COLLECTION, "root", root)
                .await?,
        )
    }
}
