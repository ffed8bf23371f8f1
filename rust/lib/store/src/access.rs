//! `Access<T>`: CRUD and equality queries for a [`Document`] collection.
//!
//! Layout in the KV backend:
//!
//! ```text
//! {collection}:doc:{id}                    → JSON document
//! {collection}:idx:{constraint}:{values}   → owning document id
//! ```
//!
//! A document write and its index updates commit in one KV batch. Writes
//! through one `Access` are serialized, so share a single instance per
//! collection.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use eventide_core::{new_id, ServiceError};
use eventide_kv::{KVError, KVStore};
use serde_json::Value;
use tracing::debug;

use crate::document::{Document, UniqueKey};
use crate::query::Query;

/// Separator between composite index values (ASCII unit separator).
const VALUE_SEPARATOR: &str = "\u{1f}";

/// One page of query results plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub total: usize,
}

pub struct Access<T: Document> {
    kv: Arc<dyn KVStore>,
    write_lock: Mutex<()>,
    _phantom: PhantomData<T>,
}

impl<T: Document> Access<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
            _phantom: PhantomData,
        }
    }

    fn doc_prefix() -> String {
        format!("{}:doc:", T::COLLECTION)
    }

    fn doc_key(id: &str) -> String {
        format!("{}{}", Self::doc_prefix(), id)
    }

    fn index_key(key: &UniqueKey) -> String {
        Self::index_key_parts(key.name, &key.values)
    }

    fn index_key_parts<S: AsRef<str>>(name: &str, values: &[S]) -> String {
        let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        format!("{}:idx:{}:{}", T::COLLECTION, name, values.join(VALUE_SEPARATOR))
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<T, ServiceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize {}: {}", T::COLLECTION, e)))
    }

    fn encode(doc: &T) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(doc)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::COLLECTION, e)))
    }

    /// Get a document by id. Returns None if it does not exist.
    pub fn get_by_id(&self, id: &str) -> Result<Option<T>, ServiceError> {
        match self.kv.get(&Self::doc_key(id)).map_err(Self::kv_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a document by id or return NotFound.
    pub fn get(&self, id: &str) -> Result<T, ServiceError> {
        self.get_by_id(id)?.ok_or_else(|| {
            ServiceError::NotFound(format!("{} with id \"{}\" not found", T::COLLECTION, id))
        })
    }

    /// The document holding `values` under the unique constraint `name`.
    /// Reads the index entry and the document only.
    pub fn get_by_unique(&self, name: &str, values: &[&str]) -> Result<Option<T>, ServiceError> {
        let index_key = Self::index_key_parts(name, values);
        let owner = match self.kv.get(&index_key).map_err(Self::kv_err)? {
            Some(owner) => owner,
            None => return Ok(None),
        };
        let id = String::from_utf8(owner).map_err(|_| {
            ServiceError::Internal(format!("{}: corrupt index entry {}", T::COLLECTION, index_key))
        })?;
        self.get_by_id(&id)
    }

    /// First document whose `name` equals `name`.
    pub fn get_by_name(&self, name: &str) -> Result<Option<T>, ServiceError> {
        self.query_one(&Query::new().filter("name", name))
    }

    /// First document matching the query (after sorting).
    pub fn query_one(&self, query: &Query) -> Result<Option<T>, ServiceError> {
        let mut query = query.clone();
        query.limit = Some(1);
        Ok(self.query(&query)?.items.into_iter().next())
    }

    /// Every document in the collection, in id order.
    pub fn all(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.query(&Query::new())?.items)
    }

    /// Filter, sort and slice the collection.
    ///
    /// The whole collection is scanned; filtering and sorting happen in memory.
    pub fn query(&self, query: &Query) -> Result<QueryResult<T>, ServiceError> {
        let entries = self.kv.scan(&Self::doc_prefix()).map_err(Self::kv_err)?;

        let mut matched = Vec::new();
        for (_key, bytes) in entries {
            let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Internal(format!("deserialize {}: {}", T::COLLECTION, e))
            })?;
            if query.matches(&value) {
                matched.push(value);
            }
        }
        if !query.sort.is_empty() {
            matched.sort_by(|a, b| query.compare(a, b));
        }

        let total = matched.len();
        let page = matched.into_iter().skip(query.offset);
        let page: Vec<Value> = match query.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        };

        let mut items = Vec::with_capacity(page.len());
        for value in page {
            let item: T = serde_json::from_value(value).map_err(|e| {
                ServiceError::Internal(format!("deserialize {}: {}", T::COLLECTION, e))
            })?;
            items.push(item);
        }
        Ok(QueryResult { items, total })
    }

    /// Number of documents in the collection.
    pub fn count(&self) -> Result<usize, ServiceError> {
        let entries = self.kv.scan(&Self::doc_prefix()).map_err(Self::kv_err)?;
        Ok(entries.len())
    }

    /// Insert or replace a document, keyed by its id. A document without an
    /// id gets a fresh one. Fails with Conflict when another document already
    /// holds one of its unique keys.
    pub fn add_or_update(&self, mut doc: T) -> Result<T, ServiceError> {
        doc.validate()?;
        if doc.id().is_empty() {
            doc.set_id(new_id());
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ServiceError::Internal(format!("{} write lock poisoned", T::COLLECTION)))?;

        let id = doc.id().to_string();
        let unique_keys = doc.unique_keys();
        let mut new_index_keys: Vec<String> = Vec::with_capacity(unique_keys.len());
        for key in &unique_keys {
            let index_key = Self::index_key(key);
            if let Some(owner) = self.kv.get(&index_key).map_err(Self::kv_err)? {
                if owner != id.as_bytes() {
                    return Err(ServiceError::Conflict(format!(
                        "{} with {} already exists",
                        T::COLLECTION,
                        key.describe()
                    )));
                }
            }
            new_index_keys.push(index_key);
        }

        // Index entries held by the previous version but not this one.
        let stale: Vec<String> = match self.get_by_id(&id)? {
            Some(existing) => existing
                .unique_keys()
                .iter()
                .map(Self::index_key)
                .filter(|k| !new_index_keys.contains(k))
                .collect(),
            None => Vec::new(),
        };

        let doc_key = Self::doc_key(&id);
        let bytes = Self::encode(&doc)?;
        let mut sets: Vec<(&str, &[u8])> = vec![(doc_key.as_str(), bytes.as_slice())];
        for index_key in &new_index_keys {
            sets.push((index_key.as_str(), id.as_bytes()));
        }
        let deletes: Vec<&str> = stale.iter().map(String::as_str).collect();

        self.kv.batch_write(&sets, &deletes).map_err(Self::kv_err)?;
        debug!("{}: saved {}", T::COLLECTION, id);
        Ok(doc)
    }

    /// Delete a document and its index entries. Returns the deleted document.
    pub fn delete(&self, id: &str) -> Result<T, ServiceError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ServiceError::Internal(format!("{} write lock poisoned", T::COLLECTION)))?;

        let doc = self.get(id)?;
        let doc_key = Self::doc_key(id);
        let index_keys: Vec<String> = doc.unique_keys().iter().map(Self::index_key).collect();
        let mut deletes: Vec<&str> = vec![doc_key.as_str()];
        deletes.extend(index_keys.iter().map(String::as_str));

        self.kv.batch_write(&[], &deletes).map_err(Self::kv_err)?;
        debug!("{}: deleted {}", T::COLLECTION, id);
        Ok(doc)
    }
}
