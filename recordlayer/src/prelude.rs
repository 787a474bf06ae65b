//! Convenient re-exports of commonly used types from recordlayer.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use recordlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record traits and lifecycle types
//! - Store backends and builders
//! - Query and update construction
//! - Change detection and coalescing
//! - Error and pagination types

pub use recordlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    canonical::CanonicalValue,
    checksum::Checksum,
    coalesce::{BatchAssign, BatchIncrement, CounterCoalescer, ValueCoalescer},
    error::{StoreError, StoreResult},
    gate::ChangeGate,
    page::{Page, PaginationParams},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    record::{IndexSpec, Record, RecordExt, SoftDelete, Timestamps},
    repository::Repository,
    store::RecordStore,
    update::{Update, UpdateOp},
};
