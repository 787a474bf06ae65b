//! Partial update statement construction.
//!
//! An [`Update`] is an ordered list of field-level operations applied to
//! matched records in place, without replacing the whole document. Use the
//! fluent builder API:
//!
//! ```ignore
//! use recordlayer::update::Update;
//!
//! let update = Update::new()
//!     .set("status", "active")
//!     .inc("login_count", 1)
//!     .unset("pending_token");
//! ```

use bson::Bson;

/// One field-level mutation inside an update statement.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Sets the field to the given value, creating it if missing.
    Set(String, Bson),
    /// Removes the field; a no-op when the field is absent.
    Unset(String),
    /// Adds a signed delta to a numeric field, treating a missing field as zero.
    Inc(String, i64),
}

impl UpdateOp {
    /// The field this operation targets; may be a dotted path.
    pub fn field(&self) -> &str {
        match self {
            UpdateOp::Set(field, _) => field,
            UpdateOp::Unset(field) => field,
            UpdateOp::Inc(field, _) => field,
        }
    }
}

/// An ordered, append-only update statement.
///
/// Operations apply in insertion order, so later operations on the same field
/// win. An empty update matches nothing and backends treat it as a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    /// Creates an empty update statement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a set operation.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.ops.push(UpdateOp::Set(field.into(), value.into()));
        self
    }

    /// Appends an unset operation.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.push(UpdateOp::Unset(field.into()));
        self
    }

    /// Appends an increment operation.
    pub fn inc(mut self, field: impl Into<String>, amount: i64) -> Self {
        self.ops.push(UpdateOp::Inc(field.into(), amount));
        self
    }

    /// True when the statement carries no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operations in application order.
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_keep_insertion_order() {
        let update = Update::new()
            .set("a", 1)
            .inc("b", 2)
            .unset("a");

        let fields: Vec<_> = update.ops().iter().map(UpdateOp::field).collect();
        assert_eq!(fields, vec!["a", "b", "a"]);
    }

    #[test]
    fn empty_update_reports_empty() {
        assert!(Update::new().is_empty());
        assert!(!Update::new().set("x", 1).is_empty());
    }
}
