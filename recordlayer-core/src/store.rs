//! Main record store interface for interacting with storage backends.
//!
//! [`RecordStore`] owns a backend and hands out typed [`Repository`] views
//! over it. It also carries the store-wide operations that don't belong to
//! one record type: collection administration and applying the batch
//! operations produced by the coalescers.
//!
//! # Example
//!
//! ```ignore
//! use recordlayer::store::RecordStore;
//!
//! let store = RecordStore::new(backend);
//! let users = store.repository::<User>();
//! users.provision().await?;
//! ```

use crate::{
    backend::StoreBackend,
    coalesce::{BatchAssign, BatchIncrement},
    error::StoreResult,
    record::{IndexSpec, Record},
    repository::Repository,
};

/// A record store bound to a specific backend implementation.
#[derive(Debug)]
pub struct RecordStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> RecordStore<B> {
    /// Creates a new record store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets a typed repository for the specified record type.
    ///
    /// The collection name is determined by the record type's
    /// `collection_name()` method.
    pub fn repository<R: Record>(&self) -> Repository<'_, B, R> {
        Repository::new(&self.backend)
    }

    /// Creates a new collection with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection already exists or creation fails.
    pub async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.backend.create_collection(name).await
    }

    /// Drops a collection and everything in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist or deletion fails.
    pub async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Registers an index on a collection.
    pub async fn add_index(&self, collection: &str, index: IndexSpec) -> StoreResult<()> {
        self.backend.add_index(collection, index).await
    }

    /// Removes an index from a collection by name.
    pub async fn drop_index(&self, collection: &str, name: &str) -> StoreResult<()> {
        self.backend.drop_index(collection, name).await
    }

    /// Applies a built set of batch increments, one patch per batch.
    ///
    /// Returns the total number of records patched. Increments never count as
    /// content changes, so no modification stamps are touched.
    pub async fn apply_increments(&self, batches: Vec<BatchIncrement>) -> StoreResult<u64> {
        let mut patched = 0;
        for batch in batches {
            patched += self
                .backend
                .patch_documents(batch.ids.clone(), batch.to_update(), &batch.collection)
                .await?;
        }
        Ok(patched)
    }

    /// Applies a built set of batch assignments, one patch per batch.
    ///
    /// Returns the total number of records patched.
    pub async fn apply_assignments(&self, batches: Vec<BatchAssign>) -> StoreResult<u64> {
        let mut patched = 0;
        for batch in batches {
            patched += self
                .backend
                .patch_documents(batch.ids.clone(), batch.to_update(), &batch.collection)
                .await?;
        }
        Ok(patched)
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// This consumes the store and should be called when no longer needed.
    pub async fn shutdown(self) -> StoreResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}
