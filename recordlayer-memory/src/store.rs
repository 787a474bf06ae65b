//! In-memory storage implementation for record stores.
//!
//! This module provides a simple but complete in-memory backend that stores
//! records as BSON values in HashMaps behind async-safe read-write locks,
//! including unique index enforcement and in-place patch application.

use async_trait::async_trait;
use bson::{Bson, Document, Uuid};
use mea::rwlock::RwLock;
use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use recordlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    query::{Query, SortDirection},
    record::IndexSpec,
    update::{Update, UpdateOp},
};

use crate::evaluator::{Comparable, RecordEvaluator, lookup_field};

type CollectionMap = HashMap<String, Bson>;
type StoreMap = HashMap<String, CollectionMap>;
type IndexMap = HashMap<String, Vec<IndexSpec>>;

/// Thread-safe in-memory record storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully
/// functional record store that operates entirely in memory using async-aware
/// read-write locks. All records are stored as BSON values indexed by their
/// UUID.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state,
/// allowing it to be safely shared across async tasks. Multiple clones of the
/// same instance share the same underlying data.
///
/// # Indexes
///
/// Registered indexes are kept as metadata; unique indexes are enforced on
/// insert by scanning the collection. Queries always scan, so for large
/// datasets prefer a persistent backend.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> (record_id -> document)
    store: Arc<RwLock<StoreMap>>,
    /// Registered indexes: collection_name -> index specs
    indexes: Arc<RwLock<IndexMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory record store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            indexes: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

/// The indexed field values of one document, with missing fields as null.
fn index_key(document: &Bson, index: &IndexSpec) -> Vec<Bson> {
    index
        .fields
        .iter()
        .map(|field| {
            lookup_field(document, field)
                .cloned()
                .unwrap_or(Bson::Null)
        })
        .collect()
}

/// Descends to the document holding the last path segment, creating missing
/// intermediate documents when `create` is set. Returns that document and the
/// final segment, or `None` when the path crosses a non-document value.
fn traverse_mut<'d>(
    document: &'d mut Document,
    path: &str,
    create: bool,
) -> Option<(&'d mut Document, String)> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop()?.to_string();

    let mut current = document;
    for segment in segments {
        if create && !matches!(current.get(segment), Some(Bson::Document(_))) {
            current.insert(segment.to_string(), Document::new());
        }
        current = match current.get_mut(segment) {
            Some(Bson::Document(inner)) => inner,
            _ => return None,
        };
    }
    Some((current, last))
}

fn apply_op(document: &mut Document, op: &UpdateOp) -> StoreResult<()> {
    match op {
        UpdateOp::Set(field, value) => {
            if let Some((target, key)) = traverse_mut(document, field, true) {
                target.insert(key, value.clone());
            }
        }
        UpdateOp::Unset(field) => {
            if let Some((target, key)) = traverse_mut(document, field, false) {
                target.remove(&key);
            }
        }
        UpdateOp::Inc(field, amount) => {
            if let Some((target, key)) = traverse_mut(document, field, true) {
                let next = match target.get(&key) {
                    Some(Bson::Int32(current)) => Bson::Int64(*current as i64 + amount),
                    Some(Bson::Int64(current)) => Bson::Int64(current + amount),
                    Some(Bson::Double(current)) => Bson::Double(current + *amount as f64),
                    None | Some(Bson::Null) => Bson::Int64(*amount),
                    Some(other) => {
                        return Err(StoreError::InvalidRecord(format!(
                            "cannot increment non-numeric field {field}: {other}"
                        )));
                    }
                };
                target.insert(key, next);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> StoreResult<()> {
        let indexes = self.indexes.read().await;
        let unique_indexes: Vec<IndexSpec> = indexes
            .get(collection)
            .map(|specs| {
                specs
                    .iter()
                    .filter(|spec| spec.unique)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(indexes);

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        // Validate the whole batch before touching the map: a rejected batch
        // must not leave earlier documents committed.
        let mut staged_ids: Vec<String> = Vec::with_capacity(documents.len());
        let mut staged_keys: Vec<(usize, Vec<Bson>)> = Vec::new();

        for (id, doc) in &documents {
            let key = id.to_string();

            if collection_map.contains_key(&key) || staged_ids.contains(&key) {
                return Err(StoreError::RecordAlreadyExists(key, collection.to_string()));
            }

            for (position, index) in unique_indexes.iter().enumerate() {
                let candidate = index_key(doc, index);
                let conflict = collection_map
                    .values()
                    .any(|existing| index_key(existing, index) == candidate)
                    || staged_keys
                        .iter()
                        .any(|(p, staged)| *p == position && *staged == candidate);
                if conflict {
                    return Err(StoreError::UniqueIndexViolation(
                        index.name.clone(),
                        collection.to_string(),
                    ));
                }
                staged_keys.push((position, candidate));
            }

            staged_ids.push(key);
        }

        for (id, doc) in documents {
            collection_map.insert(id.to_string(), doc);
        }

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(StoreError::CollectionNotFound(collection.to_string())),
        };

        for (id, doc) in documents {
            let key = id.to_string();

            if !collection_map.contains_key(&key) {
                return Err(StoreError::RecordNotFound(key, collection.to_string()));
            }

            collection_map.insert(key, doc);
        }

        Ok(())
    }

    async fn patch_documents(&self, ids: Vec<Uuid>, update: Update, collection: &str) -> StoreResult<u64> {
        if update.is_empty() {
            return Ok(0);
        }

        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(StoreError::CollectionNotFound(collection.to_string())),
        };

        let mut patched = 0;
        for id in ids {
            let Some(doc) = collection_map.get_mut(&id.to_string()) else {
                continue;
            };
            let Some(doc_map) = doc.as_document_mut() else {
                continue;
            };
            for op in update.ops() {
                apply_op(doc_map, op)?;
            }
            patched += 1;
        }

        Ok(patched)
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(StoreError::CollectionNotFound(collection.to_string())),
        };

        for id in ids {
            collection_map.remove(&id.to_string());
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> StoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut documents = Vec::with_capacity(ids.len());

        for id in ids {
            if let Some(doc) = collection_map.get(&id.to_string()) {
                documents.push(doc.clone());
            }
        }

        Ok(documents)
    }

    async fn query_documents(&self, query: Query, collection: &str) -> StoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        // Apply filter expressions if present
        let mut filtered_docs = match &query.filter {
            Some(filter) => RecordEvaluator::filter_documents(
                collection_map.values(),
                filter,
            )?,
            None => collection_map
                .values()
                .cloned()
                .collect::<Vec<_>>(),
        };

        // Apply sorting if specified
        if let Some(sort) = &query.sort {
            filtered_docs.sort_by(|a, b| {
                let left = lookup_field(a, &sort.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);
                let right = lookup_field(b, &sort.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);

                match sort.direction {
                    SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
                }
            });
        }

        Ok(filtered_docs
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_documents(&self, query: Query, collection: &str) -> StoreResult<u64> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(0),
        };

        match &query.filter {
            Some(filter) => {
                let mut count = 0;
                for doc in collection_map.values() {
                    if RecordEvaluator::new(doc).evaluate(filter)? {
                        count += 1;
                    }
                }
                Ok(count)
            }
            None => Ok(collection_map.len() as u64),
        }
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_insert_with(HashMap::new);

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(StoreError::CollectionNotFound(name.to_string()));
        }
        self.indexes.write().await.remove(name);

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .read()
            .await
            .keys()
            .cloned()
            .collect())
    }

    async fn add_index(&self, collection: &str, index: IndexSpec) -> StoreResult<()> {
        let mut indexes = self.indexes.write().await;
        let specs = indexes
            .entry(collection.to_string())
            .or_default();
        specs.retain(|existing| existing.name != index.name);
        specs.push(index);

        Ok(())
    }

    async fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()> {
        if let Some(specs) = self.indexes.write().await.get_mut(collection) {
            specs.retain(|existing| existing.name != name);
        }

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// Currently a no-op builder, but can be extended in future versions to
/// support configuration options like capacity hints.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use recordlayer_core::query::{Filter, SortDirection};

    fn user(name: &str, age: i32) -> Bson {
        Bson::Document(doc! { "name": name, "age": age })
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let store = InMemoryStore::new();
        let id = Uuid::new();
        store
            .insert_documents(vec![(id, user("Alice", 30))], "users")
            .await
            .unwrap();

        let docs = store.get_documents(vec![id], "users").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(
            lookup_field(&docs[0], "name"),
            Some(&Bson::String("Alice".into()))
        );
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = InMemoryStore::new();
        let id = Uuid::new();
        store
            .insert_documents(vec![(id, user("Alice", 30))], "users")
            .await
            .unwrap();

        let err = store
            .insert_documents(vec![(id, user("Alice", 30))], "users")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordAlreadyExists(_, _)));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let store = InMemoryStore::new();
        store.create_collection("users").await.unwrap();
        store
            .add_index("users", IndexSpec::unique("name_unique", vec!["name".into()]))
            .await
            .unwrap();

        store
            .insert_documents(vec![(Uuid::new(), user("Alice", 30))], "users")
            .await
            .unwrap();
        let err = store
            .insert_documents(vec![(Uuid::new(), user("Alice", 25))], "users")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueIndexViolation(_, _)));

        // A different value is fine.
        store
            .insert_documents(vec![(Uuid::new(), user("Bob", 25))], "users")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unique_index_catches_duplicates_within_one_batch() {
        let store = InMemoryStore::new();
        store
            .add_index("users", IndexSpec::unique("name_unique", vec!["name".into()]))
            .await
            .unwrap();

        let err = store
            .insert_documents(
                vec![
                    (Uuid::new(), user("Alice", 30)),
                    (Uuid::new(), user("Alice", 25)),
                ],
                "users",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueIndexViolation(_, _)));
    }

    #[tokio::test]
    async fn rejected_batch_insert_commits_nothing() {
        let store = InMemoryStore::new();
        store
            .add_index("users", IndexSpec::unique("name_unique", vec!["name".into()]))
            .await
            .unwrap();

        let err = store
            .insert_documents(
                vec![
                    (Uuid::new(), user("Alice", 30)),
                    (Uuid::new(), user("Bob", 25)),
                    (Uuid::new(), user("Alice", 25)),
                ],
                "users",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueIndexViolation(_, _)));
        assert_eq!(store.count_documents(Query::new(), "users").await.unwrap(), 0);

        // Same for a duplicate id mid-batch.
        let id = Uuid::new();
        let err = store
            .insert_documents(
                vec![
                    (Uuid::new(), user("Carol", 40)),
                    (id, user("Dave", 17)),
                    (id, user("Dave", 18)),
                ],
                "users",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordAlreadyExists(_, _)));
        assert_eq!(store.count_documents(Query::new(), "users").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn patch_sets_unsets_and_increments() {
        let store = InMemoryStore::new();
        let id = Uuid::new();
        store
            .insert_documents(
                vec![(id, Bson::Document(doc! { "name": "Alice", "age": 30, "temp": 1 }))],
                "users",
            )
            .await
            .unwrap();

        let patched = store
            .patch_documents(
                vec![id, Uuid::new()],
                Update::new()
                    .set("name", "Alicia")
                    .unset("temp")
                    .inc("age", 5)
                    .inc("logins", 1),
                "users",
            )
            .await
            .unwrap();
        assert_eq!(patched, 1);

        let doc = store
            .get_documents(vec![id], "users")
            .await
            .unwrap()
            .remove(0);
        assert_eq!(lookup_field(&doc, "name"), Some(&Bson::String("Alicia".into())));
        assert_eq!(lookup_field(&doc, "temp"), None);
        assert_eq!(lookup_field(&doc, "age"), Some(&Bson::Int64(35)));
        assert_eq!(lookup_field(&doc, "logins"), Some(&Bson::Int64(1)));
    }

    #[tokio::test]
    async fn patch_creates_nested_paths() {
        let store = InMemoryStore::new();
        let id = Uuid::new();
        store
            .insert_documents(vec![(id, user("Alice", 30))], "users")
            .await
            .unwrap();

        store
            .patch_documents(
                vec![id],
                Update::new().set("profile.city", "Oslo"),
                "users",
            )
            .await
            .unwrap();

        let doc = store
            .get_documents(vec![id], "users")
            .await
            .unwrap()
            .remove(0);
        assert_eq!(
            lookup_field(&doc, "profile.city"),
            Some(&Bson::String("Oslo".into()))
        );
    }

    #[tokio::test]
    async fn increment_of_non_numeric_field_errors() {
        let store = InMemoryStore::new();
        let id = Uuid::new();
        store
            .insert_documents(vec![(id, user("Alice", 30))], "users")
            .await
            .unwrap();

        let err = store
            .patch_documents(vec![id], Update::new().inc("name", 1), "users")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn query_filters_sorts_and_paginates() {
        let store = InMemoryStore::new();
        store
            .insert_documents(
                vec![
                    (Uuid::new(), user("Alice", 30)),
                    (Uuid::new(), user("Bob", 25)),
                    (Uuid::new(), user("Carol", 35)),
                    (Uuid::new(), user("Dave", 17)),
                ],
                "users",
            )
            .await
            .unwrap();

        let query = Query::builder()
            .filter(Filter::gte("age", 18))
            .sort("age", SortDirection::Desc)
            .limit(2)
            .build();
        let docs = store.query_documents(query, "users").await.unwrap();

        let names: Vec<_> = docs
            .iter()
            .map(|doc| lookup_field(doc, "name").unwrap().clone())
            .collect();
        assert_eq!(
            names,
            vec![Bson::String("Carol".into()), Bson::String("Alice".into())]
        );
    }

    #[tokio::test]
    async fn count_ignores_pagination() {
        let store = InMemoryStore::new();
        store
            .insert_documents(
                vec![
                    (Uuid::new(), user("Alice", 30)),
                    (Uuid::new(), user("Bob", 25)),
                    (Uuid::new(), user("Dave", 17)),
                ],
                "users",
            )
            .await
            .unwrap();

        let query = Query::builder()
            .filter(Filter::gte("age", 18))
            .limit(1)
            .build();
        assert_eq!(store.count_documents(query, "users").await.unwrap(), 2);
        assert_eq!(
            store
                .count_documents(Query::new(), "users")
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn drop_collection_removes_documents_and_indexes() {
        let store = InMemoryStore::new();
        store.create_collection("users").await.unwrap();
        store
            .add_index("users", IndexSpec::unique("name_unique", vec!["name".into()]))
            .await
            .unwrap();
        store.drop_collection("users").await.unwrap();

        assert!(store.list_collections().await.unwrap().is_empty());
        assert!(matches!(
            store.drop_collection("users").await.unwrap_err(),
            StoreError::CollectionNotFound(_)
        ));
    }
}
