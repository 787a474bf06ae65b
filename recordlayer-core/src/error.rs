//! Error and result types for record store operations.
//!
//! Use [`StoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a record store.
///
/// This enum covers serialization errors, record lifecycle issues, collection
/// management, index constraints, and backend-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting between record formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A record with the given ID already exists in the collection.
    /// The first argument is the record ID, the second is the collection name.
    #[error("Record {0} already exists in collection {1}")]
    RecordAlreadyExists(String, String),
    /// The requested record was not found in the collection.
    /// The first argument is the record ID, the second is the collection name.
    #[error("Record not found {0} in collection {1}")]
    RecordNotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// A write would duplicate a value constrained by a unique index.
    /// The arguments are the index name and the collection name.
    #[error("Unique index {0} violated in collection {1}")]
    UniqueIndexViolation(String, String),
    /// The record violates schema constraints or has invalid structure.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
    /// An unknown error occurred.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// A specialized `Result` type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
