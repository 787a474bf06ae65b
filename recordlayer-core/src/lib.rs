//! A thin document database repository layer with change detection and write coalescing.
//!
//! This crate is the core of the recordlayer project and provides:
//!
//! - **Record traits** ([`record`]) - Core traits for defining, serializing, and provisioning records
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Query and filtering API** ([`query`]) - Type-safe query construction and filtering
//! - **Update statements** ([`update`]) - Partial update construction for in-place patches
//! - **Repositories** ([`repository`]) - Typed CRUD interface with lifecycle stamping
//! - **Record store** ([`store`]) - Main interface owning the backend
//! - **Canonicalization** ([`canonical`]) - Closed value tree for structural comparison
//! - **Checksums** ([`checksum`]) - Deterministic normalization and MD5 digests
//! - **Change gates** ([`gate`]) - Per-record digests that tell real changes from re-saves
//! - **Coalescers** ([`coalesce`]) - Batching of counter deltas and value assignments
//! - **Error handling** ([`error`]) - Error and result types
//! - **Pagination** ([`page`]) - Page results and pagination parameters
//!
//! # Example
//!
//! ```ignore
//! use recordlayer::{Record, RecordStore, Timestamps};
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
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "users"
//!     }
//!
//!     fn timestamps(&self) -> &Timestamps {
//!         &self.timestamps
//!     }
//!
//!     fn timestamps_mut(&mut self) -> &mut Timestamps {
//!         &mut self.timestamps
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as recordlayer_core;

pub mod backend;
pub mod canonical;
pub mod checksum;
pub mod coalesce;
pub mod error;
pub mod gate;
pub mod page;
pub mod query;
pub mod record;
pub mod repository;
pub mod store;
pub mod update;
