//! Storage backend abstraction for the record store.
//!
//! This module defines the core trait that abstracts over different storage
//! implementations, allowing the record store to work with various backends
//! (in-memory, persistent, distributed, etc.).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for all storage
//! operations: record insertion, retrieval, replacement, partial patching,
//! deletion, querying, counting, and collection/index management. Implementations
//! are required to be thread-safe (`Send + Sync`) and support concurrent access.
//!
//! # Error Handling
//!
//! Operations return [`StoreResult<T>`](crate::error::StoreResult). Implementers
//! should document which error variants may be returned by each operation.

use async_trait::async_trait;
use bson::{Bson, Uuid};
use std::fmt::Debug;

use crate::{error::StoreResult, query::Query, record::IndexSpec, update::Update};

/// Abstract interface for record storage backends.
///
/// Implementers of this trait provide concrete storage strategies for records,
/// from simple in-memory stores to external document databases. The trait defines
/// essential operations for record lifecycle management and collection
/// administration.
///
/// All implementations must be thread-safe and support concurrent access from
/// multiple async tasks. The exact concurrency model is implementation-specific
/// and should be documented by the implementer.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents into a collection.
    ///
    /// Batches the insertion of multiple documents into a single collection,
    /// which is created automatically if it doesn't exist. Inserting a document
    /// whose ID already exists, or whose content violates a unique index, is an
    /// error and the whole batch is rejected.
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> StoreResult<()>;

    /// Replaces existing documents in a collection entirely.
    ///
    /// If a document with the specified ID does not exist the backend returns
    /// a [`StoreError::RecordNotFound`](crate::error::StoreError::RecordNotFound).
    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> StoreResult<()>;

    /// Applies a partial update statement to the documents with the given IDs.
    ///
    /// Documents are mutated in place per the statement's operations; IDs that
    /// don't exist are skipped. Returns the number of documents actually
    /// patched. An empty statement patches nothing.
    async fn patch_documents(
        &self,
        ids: Vec<Uuid>,
        update: Update,
        collection: &str,
    ) -> StoreResult<u64>;

    /// Deletes documents from a collection by their IDs.
    ///
    /// IDs that don't exist are silently skipped (idempotent operation).
    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> StoreResult<()>;

    /// Retrieves documents from a collection by their IDs.
    ///
    /// Fetches multiple documents in a single operation. If a document ID
    /// doesn't exist it is simply omitted from the results; order is not
    /// guaranteed to match the request order.
    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> StoreResult<Vec<Bson>>;

    /// Queries documents in a collection using a structured query.
    ///
    /// Applies the query's filter expression, sorting, and pagination to select
    /// matching documents.
    ///
    /// # See Also
    ///
    /// - [`Query`] for constructing queries
    /// - [`crate::query::Filter`] for building filter expressions
    async fn query_documents(&self, query: Query, collection: &str) -> StoreResult<Vec<Bson>>;

    /// Counts documents matching a query's filter, ignoring its pagination.
    async fn count_documents(&self, query: Query, collection: &str) -> StoreResult<u64>;

    /// Creates a new collection with the specified name.
    ///
    /// Creating a collection that already exists is an error.
    async fn create_collection(&self, name: &str) -> StoreResult<()>;

    /// Drops a collection, all its documents, and its indexes.
    ///
    /// This operation is irreversible. Dropping a collection that doesn't
    /// exist is an error.
    async fn drop_collection(&self, name: &str) -> StoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Registers an index on a collection.
    ///
    /// Unique indexes are enforced on subsequent inserts. Registering an index
    /// whose name already exists on the collection replaces the old definition.
    async fn add_index(&self, collection: &str, index: IndexSpec) -> StoreResult<()>;

    /// Removes an index from a collection by name.
    async fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends with persistent
    /// storage or external connections should override this.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for constructing backend instances from configuration.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
