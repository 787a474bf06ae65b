//! Main recordlayer crate providing a unified interface for record storage.
//!
//! This crate is the primary entry point for users of the recordlayer framework.
//! It re-exports the core types and functionality from the sub-crates and
//! provides convenient access to storage backends.
//!
//! # Features
//!
//! - **Type-safe record storage** - Define your data structures with Serde and store them safely
//! - **Write minimization** - Per-record change gates suppress modification stamps on idempotent re-saves
//! - **Batch coalescing** - Collapse many counter deltas or value assignments into few batch writes
//! - **Flexible querying** - Powerful, composable query API for filtering, sorting, and pagination
//! - **Provisioning** - Declarative collection creation, index registration, and seeding
//!
//! # Quick Start
//!
//! ```ignore
//! use recordlayer::{prelude::*, memory::InMemoryStore};
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
//! async fn main() {
//!     let store = RecordStore::new(InMemoryStore::new());
//!     let users = store.repository::<User>();
//!     users.provision().await.unwrap();
//!
//!     let mut user = User {
//!         id: Uuid::new(),
//!         name: "Alice".to_string(),
//!         timestamps: Timestamps::default(),
//!     };
//!     users.insert(&mut user).await.unwrap();
//!
//!     let results = users
//!         .find(
//!             Query::builder()
//!                 .filter(Filter::eq("name", "Alice"))
//!                 .build(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     println!("Queried users: {:?}", results);
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Change gating
//!
//! Records that embed a [`ChangeGate`](gate::ChangeGate) and expose a
//! comparable view get write minimization for free: the repository digests
//! the view on every save and only stamps `updated_at` when the digest moved.
//!
//! ```ignore
//! impl Record for Article {
//!     // ...
//!     fn comparable_view(&self) -> CanonicalValue {
//!         [
//!             ("title".to_string(), CanonicalValue::from(self.title.as_str())),
//!             ("body".to_string(), CanonicalValue::from(self.body.as_str())),
//!         ]
//!         .into_iter()
//!         .collect()
//!     }
//!
//!     fn change_gate(&self) -> Option<&ChangeGate> { Some(&self.gate) }
//!     fn change_gate_mut(&mut self) -> Option<&mut ChangeGate> { Some(&mut self.gate) }
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing

pub mod prelude;

pub use recordlayer_core::{
    backend, canonical, checksum, coalesce, error, gate, page, query, record, repository, store,
    update,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use recordlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}
