//! Typed repository over a record collection.
//!
//! A [`Repository`] binds one record type to its collection on a backend and
//! drives the record lifecycle: creation stamps on insert, change-gated
//! modification stamps on save, partial patches, queries, and provisioning
//! (collection creation, index registration, seeding).
//!
//! # Timestamps convention
//!
//! Records embed [`Timestamps`](crate::record::Timestamps) with
//! `#[serde(flatten)]`, so `created_at` and `updated_at` serialize at the
//! document's top level. Non-silent patches rely on this to stamp
//! `updated_at` by field name.

use bson::{Uuid, ser::serialize_to_bson};
use chrono::Utc;
use std::marker::PhantomData;

use crate::{
    backend::StoreBackend,
    error::StoreResult,
    page::{Page, PaginationParams},
    query::Query,
    record::{Record, RecordExt},
    update::Update,
};

/// A typed repository bound to one record type's collection.
///
/// Cheap to construct; holds only a backend reference. Obtain one from
/// [`RecordStore::repository`](crate::store::RecordStore::repository).
#[derive(Debug)]
pub struct Repository<'a, B: StoreBackend, R: Record> {
    backend: &'a B,
    _marker: PhantomData<R>,
}

impl<'a, B: StoreBackend, R: Record> Repository<'a, B, R> {
    pub(crate) fn new(backend: &'a B) -> Self {
        Self { backend, _marker: PhantomData }
    }

    /// Returns the name of the collection this repository targets.
    pub fn collection_name(&self) -> &'static str {
        R::collection_name()
    }

    /// Inserts a new record.
    ///
    /// Stamps `created_at`, primes the change gate (when present) with the
    /// record's initial comparable view, and runs the record's cleanup hook
    /// before writing. The gate is left unverified so the record is picked up
    /// by the next verification sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if a record with the same ID already exists, a unique
    /// index is violated, or serialization fails.
    pub async fn insert(&self, record: &mut R) -> StoreResult<()> {
        self.prepare_insert(record);
        self.backend
            .insert_documents(
                vec![(*record.id(), record.to_bson()?)],
                R::collection_name(),
            )
            .await
    }

    /// Inserts a batch of new records in one backend call.
    ///
    /// Each record goes through the same preparation as [`Repository::insert`].
    pub async fn insert_many(&self, records: &mut [R]) -> StoreResult<()> {
        let mut documents = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            self.prepare_insert(record);
            documents.push((*record.id(), record.to_bson()?));
        }
        self.backend
            .insert_documents(documents, R::collection_name())
            .await
    }

    fn prepare_insert(&self, record: &mut R) {
        record.timestamps_mut().stamp_created();
        let view = record.comparable_view();
        if let Some(gate) = record.change_gate_mut() {
            gate.prime(&view);
        }
        record.cleanup();
    }

    /// Saves an existing record, replacing the stored document.
    ///
    /// For gated records the comparable view is digested and compared against
    /// the stored digest: an idempotent re-save leaves `updated_at` untouched.
    /// Ungated records count every save as a change. With `silent` set the
    /// modification stamp is suppressed even for real changes, while the gate
    /// digest still advances.
    ///
    /// Returns whether the record content was considered changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or serialization fails.
    pub async fn save(&self, record: &mut R, silent: bool) -> StoreResult<bool> {
        let view = record.comparable_view();
        let changed = match record.change_gate_mut() {
            Some(gate) => gate.observe(&view),
            None => true,
        };
        if changed && !silent {
            record.timestamps_mut().stamp_modified();
        }
        record.cleanup();

        self.backend
            .update_documents(
                vec![(*record.id(), record.to_bson()?)],
                R::collection_name(),
            )
            .await?;
        Ok(changed)
    }

    /// Retrieves a record by ID, or `None` if it doesn't exist.
    pub async fn get(&self, id: Uuid) -> StoreResult<Option<R>> {
        Ok(self
            .backend
            .get_documents(vec![id], R::collection_name())
            .await?
            .into_iter()
            .map(R::from_bson)
            .next()
            .transpose()?)
    }

    /// Retrieves multiple records by ID; missing IDs are omitted.
    pub async fn get_many(&self, ids: Vec<Uuid>) -> StoreResult<Vec<R>> {
        self.backend
            .get_documents(ids, R::collection_name())
            .await?
            .into_iter()
            .map(R::from_bson)
            .collect()
    }

    /// Queries records matching a structured query.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<R>> {
        self.backend
            .query_documents(query, R::collection_name())
            .await?
            .into_iter()
            .map(R::from_bson)
            .collect()
    }

    /// Returns the first record matching a query, if any.
    pub async fn find_one(&self, mut query: Query) -> StoreResult<Option<R>> {
        query.limit = Some(1);
        Ok(self.find(query).await?.into_iter().next())
    }

    /// Returns one page of the records matching a query, with navigation
    /// metadata computed from the total matching count.
    pub async fn find_page(
        &self,
        mut query: Query,
        params: &PaginationParams,
    ) -> StoreResult<Page<R>> {
        let count = self
            .backend
            .count_documents(query.clone(), R::collection_name())
            .await? as usize;

        query.limit = Some(params.per_page);
        query.offset = Some(params.offset());
        let items = self.find(query).await?;

        let end = params.offset() + items.len();
        Ok(Page {
            items,
            count,
            next_page: (end < count).then(|| params.page + 1),
            previous_page: (params.page > 1).then(|| params.page - 1),
        })
    }

    /// Counts records matching a query's filter.
    pub async fn count(&self, query: Query) -> StoreResult<u64> {
        self.backend
            .count_documents(query, R::collection_name())
            .await
    }

    /// Deletes records by ID. Missing IDs are silently skipped.
    pub async fn delete(&self, ids: Vec<Uuid>) -> StoreResult<()> {
        self.backend
            .delete_documents(ids, R::collection_name())
            .await
    }

    /// Applies a partial update to the records with the given IDs.
    ///
    /// Unless `silent` is set, `updated_at` is stamped on the patched records
    /// as part of the same statement. Returns the number of records patched.
    pub async fn patch(&self, ids: Vec<Uuid>, update: Update, silent: bool) -> StoreResult<u64> {
        let update = if silent {
            update
        } else {
            // Stamped through serde so the stored form matches how
            // `Timestamps` serializes `updated_at`.
            update.set("updated_at", serialize_to_bson(&Some(Utc::now()))?)
        };
        self.backend
            .patch_documents(ids, update, R::collection_name())
            .await
    }

    /// Adjusts a numeric field on the given records by a signed delta.
    ///
    /// Counter maintenance never counts as a content change, so this is
    /// always silent.
    pub async fn increment(&self, ids: Vec<Uuid>, field: &str, amount: i64) -> StoreResult<u64> {
        self.backend
            .patch_documents(
                ids,
                Update::new().inc(field, amount),
                R::collection_name(),
            )
            .await
    }

    /// Provisions the record's collection: creates it if missing, registers
    /// the declared indexes, and loads seed records when the collection is
    /// empty.
    ///
    /// Safe to call on every startup; an already-provisioned collection is
    /// left alone apart from index re-registration.
    pub async fn provision(&self) -> StoreResult<()> {
        let name = R::collection_name();
        let existing = self.backend.list_collections().await?;
        if !existing.iter().any(|c| c == name) {
            self.backend.create_collection(name).await?;
        }

        for index in R::indexes() {
            self.backend.add_index(name, index).await?;
        }

        if self.backend.count_documents(Query::new(), name).await? == 0 {
            let mut seeds = R::seed()
                .into_iter()
                .map(R::from_json)
                .collect::<StoreResult<Vec<R>>>()?;
            if !seeds.is_empty() {
                self.insert_many(&mut seeds).await?;
            }
        }

        Ok(())
    }
}
