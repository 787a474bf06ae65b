//! In-memory record storage backend for recordlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. It uses async-aware read-write locks for concurrent
//! access and is ideal for development, testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Type-erased storage** - Stores records as BSON for flexibility
//! - **Full query support** - Filtering with dotted paths, sorting, and pagination
//! - **Index metadata** - Registered unique indexes are enforced on insert
//! - **In-place patches** - Set/unset/increment without replacing whole documents
//!
//! # Quick Start
//!
//! ```ignore
//! use recordlayer::{Record, RecordStore, Timestamps, memory::InMemoryStore};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: Uuid,
//!     pub name: String,
//!     #[serde(flatten)]
//!     pub timestamps: Timestamps,
//! }
//!
//! impl Record for User {
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "users" }
//!     fn timestamps(&self) -> &Timestamps { &self.timestamps }
//!     fn timestamps_mut(&mut self) -> &mut Timestamps { &mut self.timestamps }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::new(InMemoryStore::new());
//!     let users = store.repository::<User>();
//!
//!     let mut user = User {
//!         id: Uuid::new(),
//!         name: "Alice".to_string(),
//!         timestamps: Timestamps::default(),
//!     };
//!     users.insert(&mut user).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
