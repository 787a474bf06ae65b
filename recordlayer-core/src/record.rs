//! Core traits and types for record representation and lifecycle.
//!
//! This module provides the fundamental traits that all stored records must implement,
//! utilities for converting records between formats (BSON, JSON), and the lifecycle
//! hooks the repository layer drives: timestamps, comparable views, change gates,
//! index declarations and seeding.

use bson::{Bson, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::canonical::CanonicalValue;
use crate::checksum::Checksum;
use crate::error::StoreResult;
use crate::gate::ChangeGate;

/// Core trait that all records stored in a record store must implement.
///
/// This trait defines the minimal interface required for a type to be stored.
/// Every record must have a unique identifier (UUID) and specify which
/// collection it belongs to.
///
/// # Example
///
/// ```ignore
/// use recordlayer::record::Record;
/// use bson::Uuid;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: Uuid,
///     pub name: String,
///     pub email: String,
///     #[serde(flatten)]
///     pub timestamps: Timestamps,
/// }
///
/// impl Record for User {
///     fn id(&self) -> &Uuid {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
///
///     fn timestamps(&self) -> &Timestamps {
///         &self.timestamps
///     }
///
///     fn timestamps_mut(&mut self) -> &mut Timestamps {
///         &mut self.timestamps
///     }
/// }
/// ```
pub trait Record: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns a reference to this record's unique identifier.
    fn id(&self) -> &Uuid;

    /// Returns the name of the collection this record belongs to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users", "products").
    /// The collection will be automatically created if it doesn't exist.
    fn collection_name() -> &'static str;

    /// Returns the creation/modification timestamps carried by this record.
    fn timestamps(&self) -> &Timestamps;

    /// Returns the timestamps mutably; the repository stamps them on writes.
    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// Builds the comparable view of this record: the canonical tree over the
    /// fields that count as meaningful content.
    ///
    /// The default view is empty, which disables change gating — every save
    /// is treated as a content change.
    fn comparable_view(&self) -> CanonicalValue {
        CanonicalValue::Null
    }

    /// Returns the embedded change gate, if this record opts into gating.
    fn change_gate(&self) -> Option<&ChangeGate> {
        None
    }

    /// Mutable access to the embedded change gate.
    fn change_gate_mut(&mut self) -> Option<&mut ChangeGate> {
        None
    }

    /// Called by the repository immediately before a record is written,
    /// after change detection. Use it to normalize derived fields.
    fn cleanup(&mut self) {}

    /// Declares the indexes this record's collection should carry. Applied
    /// during provisioning.
    fn indexes() -> Vec<IndexSpec> {
        Vec::new()
    }

    /// Initial records to load into an empty collection during provisioning,
    /// as JSON values deserializable into `Self`.
    fn seed() -> Vec<Value> {
        Vec::new()
    }
}

/// Extension trait providing serialization and gating utilities for records.
///
/// Automatically implemented for all types that implement [`Record`].
pub trait RecordExt: Record {
    /// Converts this record to a BSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_bson(&self) -> StoreResult<Bson>;

    /// Creates a record from a BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_bson(bson: Bson) -> StoreResult<Self>;

    /// Converts this record to a JSON value for serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> StoreResult<Value>;

    /// Creates a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_json(value: Value) -> StoreResult<Self>;

    /// True when this record carries a change gate.
    fn is_gated(&self) -> bool;

    /// Digest of the current comparable view.
    fn content_digest(&self) -> String;
}

impl<R: Record> RecordExt for R {
    fn to_bson(&self) -> StoreResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }

    fn from_bson(bson: Bson) -> StoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        Ok(from_value(value)?)
    }

    fn is_gated(&self) -> bool {
        self.change_gate().is_some()
    }

    fn content_digest(&self) -> String {
        Checksum::md5(&self.comparable_view())
    }
}

/// Creation and modification stamps embedded in every record.
///
/// `updated_at` stays `None` until the record's content actually changes; an
/// idempotent re-save of a gated record never sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the record was first inserted.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the record content last changed.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Sets the creation stamp to the current time.
    pub fn stamp_created(&mut self) {
        self.created_at = Some(Utc::now());
    }

    /// Sets the modification stamp to the current time.
    pub fn stamp_modified(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Soft-deletion stamp for records that are hidden rather than removed.
///
/// Embed with `#[serde(flatten)]` so `deleted_at` serializes at the document's
/// top level and queries can filter on it. A soft delete is not a content
/// change: the comparable view should not include `deleted_at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftDelete {
    /// When the record was soft deleted; `None` while it is live.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete {
    /// Marks the record deleted as of now.
    pub fn soft_delete(&mut self) {
        self.deleted_at = Some(Utc::now());
    }

    /// Clears the deletion stamp, making the record live again.
    pub fn restore(&mut self) {
        self.deleted_at = None;
    }

    /// True while the deletion stamp is set.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Declarative description of one index on a record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name, unique within the collection.
    pub name: String,
    /// Record fields the index covers, in order.
    pub fields: Vec<String>,
    /// Whether the indexed field combination must be unique per record.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a non-unique index over the given fields.
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            unique: false,
        }
    }

    /// Creates a unique index over the given fields.
    pub fn unique(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            unique: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        body: String,
        #[serde(default)]
        timestamps: Timestamps,
    }

    impl Record for Note {
        fn id(&self) -> &Uuid {
            &self.id
        }

        fn collection_name() -> &'static str {
            "notes"
        }

        fn timestamps(&self) -> &Timestamps {
            &self.timestamps
        }

        fn timestamps_mut(&mut self) -> &mut Timestamps {
            &mut self.timestamps
        }

        fn comparable_view(&self) -> CanonicalValue {
            [("body".to_string(), CanonicalValue::from(self.body.as_str()))]
                .into_iter()
                .collect()
        }
    }

    #[test]
    fn bson_round_trip_preserves_identity() {
        let note = Note {
            id: Uuid::new(),
            body: "hello".to_string(),
            timestamps: Timestamps::default(),
        };

        let restored = Note::from_bson(note.to_bson().unwrap()).unwrap();
        assert_eq!(restored.id, note.id);
        assert_eq!(restored.body, note.body);
    }

    #[test]
    fn content_digest_follows_the_comparable_view() {
        let mut note = Note {
            id: Uuid::new(),
            body: "hello".to_string(),
            timestamps: Timestamps::default(),
        };
        let before = note.content_digest();
        note.body = "changed".to_string();

        assert_ne!(note.content_digest(), before);
    }

    #[test]
    fn default_record_is_ungated() {
        let note = Note {
            id: Uuid::new(),
            body: String::new(),
            timestamps: Timestamps::default(),
        };

        assert!(!note.is_gated());
    }

    #[test]
    fn timestamps_start_unset() {
        let stamps = Timestamps::default();
        assert!(stamps.created_at.is_none());
        assert!(stamps.updated_at.is_none());
    }

    #[test]
    fn soft_delete_stamps_and_restores() {
        let mut deletion = SoftDelete::default();
        assert!(!deletion.is_deleted());

        deletion.soft_delete();
        assert!(deletion.is_deleted());
        assert!(deletion.deleted_at.is_some());

        deletion.restore();
        assert!(!deletion.is_deleted());
        assert!(deletion.deleted_at.is_none());
    }
}
