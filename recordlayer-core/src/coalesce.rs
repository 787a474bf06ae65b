//! Delta coalescing: collapsing many per-record pending changes into the
//! fewest possible batch write operations.
//!
//! Two engines share the same shape. [`CounterCoalescer`] accumulates signed
//! numeric deltas and sums repeated contributions to the same (collection,
//! attribute, id) triple; [`ValueCoalescer`] accumulates final-value
//! assignments where the last write for a triple wins. Both convert their
//! accumulated state into grouped batch operations on [`CounterCoalescer::build`] /
//! [`ValueCoalescer::build`]: every record that ended up needing the identical
//! attribute change lands in one operation, so the caller issues one batch
//! write per group instead of one write per record.
//!
//! Coalescers are plain single-threaded value types. `add` mutates
//! accumulation state; `build` is read-only and may be called repeatedly —
//! adds made after a build keep accumulating toward a later build.

use bson::{Bson, Uuid};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::update::Update;

/// One batch increment: add `values` to every document whose id is in `ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchIncrement {
    /// Target collection name.
    pub collection: String,
    /// Every record that ended with this exact net delta.
    pub ids: Vec<Uuid>,
    /// Attribute name to signed delta.
    pub values: HashMap<String, i64>,
}

impl BatchIncrement {
    /// Renders this batch as an update statement.
    pub fn to_update(&self) -> Update {
        self.values
            .iter()
            .fold(Update::new(), |update, (field, amount)| {
                update.inc(field.clone(), *amount)
            })
    }
}

/// One batch assignment: set `values` on every document whose id is in `ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchAssign {
    /// Target collection name.
    pub collection: String,
    /// Every record that ended with this exact final value.
    pub ids: Vec<Uuid>,
    /// Attribute name to final value.
    pub values: HashMap<String, Bson>,
}

impl BatchAssign {
    /// Renders this batch as an update statement.
    pub fn to_update(&self) -> Update {
        self.values
            .iter()
            .fold(Update::new(), |update, (field, value)| {
                update.set(field.clone(), value.clone())
            })
    }
}

#[derive(Debug, Clone)]
struct Delta {
    id: Uuid,
    attribute: String,
    amount: i64,
}

/// Accumulates signed counter deltas keyed by (collection, attribute, id).
///
/// Repeated adds for the same triple sum their amounts; a triple whose final
/// amount is zero requires no write and is dropped at build time.
#[derive(Debug, Clone, Default)]
pub struct CounterCoalescer {
    // BTreeMap keeps collection iteration deterministic at build time.
    entries: BTreeMap<String, Vec<Delta>>,
}

impl CounterCoalescer {
    /// Creates an empty coalescer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contributes `amount` to the running total for the triple. A `None` id
    /// is silently ignored so callers can add unconditionally inside loops.
    pub fn add(
        &mut self,
        collection: impl Into<String>,
        attribute: impl Into<String>,
        id: Option<Uuid>,
        amount: i64,
    ) -> &mut Self {
        let Some(id) = id else {
            return self;
        };

        let attribute = attribute.into();
        let deltas = self.entries.entry(collection.into()).or_default();
        match deltas
            .iter_mut()
            .find(|delta| delta.id == id && delta.attribute == attribute)
        {
            Some(delta) => delta.amount += amount,
            None => deltas.push(Delta { id, attribute, amount }),
        }
        self
    }

    /// Contributes a negative amount; see [`CounterCoalescer::add`].
    pub fn sub(
        &mut self,
        collection: impl Into<String>,
        attribute: impl Into<String>,
        id: Option<Uuid>,
        amount: i64,
    ) -> &mut Self {
        self.add(collection, attribute, id, -amount)
    }

    /// Reduces the accumulated deltas to the minimal set of grouped batch
    /// increments.
    ///
    /// Records sharing the identical (attribute, final amount) pair within a
    /// collection are grouped into one operation; net-zero totals are
    /// dropped. The output is uniquely determined by the sequence of adds.
    pub fn build(&self) -> Vec<BatchIncrement> {
        let mut result = Vec::new();
        for (collection, deltas) in &self.entries {
            // Local to one build call: which (attribute, amount) groups this
            // collection already emitted.
            let mut emitted: HashSet<(&str, i64)> = HashSet::new();
            for delta in deltas {
                if delta.amount == 0 || !emitted.insert((&delta.attribute, delta.amount)) {
                    continue;
                }

                let ids = deltas
                    .iter()
                    .filter(|other| {
                        other.attribute == delta.attribute && other.amount == delta.amount
                    })
                    .map(|other| other.id)
                    .collect();
                result.push(BatchIncrement {
                    collection: collection.clone(),
                    ids,
                    values: HashMap::from([(delta.attribute.clone(), delta.amount)]),
                });
            }
        }
        result
    }
}

#[derive(Debug, Clone)]
struct Assignment {
    id: Uuid,
    attribute: String,
    value: Bson,
}

/// Accumulates final-value assignments keyed by (collection, attribute, id).
///
/// Unlike the counter variant a later add *replaces* the stored value for the
/// triple, and every accumulated assignment is emitted at build time — the
/// coalescer knows nothing about committed state, only about the calls made
/// to it in the current batch.
#[derive(Debug, Clone, Default)]
pub struct ValueCoalescer {
    entries: BTreeMap<String, Vec<Assignment>>,
}

impl ValueCoalescer {
    /// Creates an empty coalescer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the final value for the triple, replacing any earlier one. A
    /// `None` id is silently ignored.
    pub fn add(
        &mut self,
        collection: impl Into<String>,
        attribute: impl Into<String>,
        id: Option<Uuid>,
        value: impl Into<Bson>,
    ) -> &mut Self {
        let Some(id) = id else {
            return self;
        };

        let attribute = attribute.into();
        let value = value.into();
        let assignments = self.entries.entry(collection.into()).or_default();
        match assignments
            .iter_mut()
            .find(|assignment| assignment.id == id && assignment.attribute == attribute)
        {
            Some(assignment) => assignment.value = value,
            None => assignments.push(Assignment { id, attribute, value }),
        }
        self
    }

    /// Reduces the accumulated assignments to grouped batch assignments,
    /// grouping records by structural equality of (attribute, value).
    pub fn build(&self) -> Vec<BatchAssign> {
        let mut result = Vec::new();
        for (collection, assignments) in &self.entries {
            let mut emitted: Vec<(&str, &Bson)> = Vec::new();
            for assignment in assignments {
                let group = (assignment.attribute.as_str(), &assignment.value);
                if emitted.contains(&group) {
                    continue;
                }
                emitted.push(group);

                let ids = assignments
                    .iter()
                    .filter(|other| {
                        other.attribute == assignment.attribute && other.value == assignment.value
                    })
                    .map(|other| other.id)
                    .collect();
                result.push(BatchAssign {
                    collection: collection.clone(),
                    ids,
                    values: HashMap::from([(
                        assignment.attribute.clone(),
                        assignment.value.clone(),
                    )]),
                });
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_sums_repeated_adds_per_triple() {
        let id = Uuid::new();
        let mut coalescer = CounterCoalescer::new();
        coalescer
            .add("posts", "likes", Some(id), 2)
            .add("posts", "likes", Some(id), 3);

        let batches = coalescer.build();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].values.get("likes"), Some(&5));
        assert_eq!(batches[0].ids, vec![id]);
    }

    #[test]
    fn counter_drops_net_zero_deltas() {
        let id = Uuid::new();
        let mut coalescer = CounterCoalescer::new();
        coalescer
            .add("posts", "likes", Some(id), 5)
            .sub("posts", "likes", Some(id), 5);

        assert!(coalescer.build().is_empty());
    }

    #[test]
    fn counter_groups_records_with_the_same_net_delta() {
        let first = Uuid::new();
        let second = Uuid::new();
        let third = Uuid::new();
        let mut coalescer = CounterCoalescer::new();
        coalescer
            .add("posts", "likes", Some(first), 1)
            .add("posts", "likes", Some(second), 1)
            .add("posts", "likes", Some(third), 7);

        let batches = coalescer.build();
        assert_eq!(batches.len(), 2);

        let shared = batches
            .iter()
            .find(|batch| batch.values.get("likes") == Some(&1))
            .unwrap();
        assert_eq!(shared.ids, vec![first, second]);

        let lone = batches
            .iter()
            .find(|batch| batch.values.get("likes") == Some(&7))
            .unwrap();
        assert_eq!(lone.ids, vec![third]);
    }

    #[test]
    fn counter_ignores_missing_ids() {
        let mut coalescer = CounterCoalescer::new();
        coalescer.add("posts", "likes", None, 10);

        assert!(coalescer.build().is_empty());
    }

    #[test]
    fn counter_build_leaves_accumulation_untouched() {
        let id = Uuid::new();
        let mut coalescer = CounterCoalescer::new();
        coalescer.add("posts", "likes", Some(id), 1);

        assert_eq!(coalescer.build().len(), 1);
        coalescer.add("posts", "likes", Some(id), 1);

        let batches = coalescer.build();
        assert_eq!(batches[0].values.get("likes"), Some(&2));
    }

    #[test]
    fn value_last_write_wins() {
        let id = Uuid::new();
        let mut coalescer = ValueCoalescer::new();
        coalescer
            .add("users", "status", Some(id), "a")
            .add("users", "status", Some(id), "b");

        let batches = coalescer.build();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].values.get("status"),
            Some(&Bson::String("b".to_string()))
        );
    }

    #[test]
    fn value_groups_by_structural_equality() {
        let first = Uuid::new();
        let second = Uuid::new();
        let third = Uuid::new();
        let mut coalescer = ValueCoalescer::new();
        coalescer
            .add("users", "status", Some(first), "active")
            .add("users", "status", Some(second), "active")
            .add("users", "status", Some(third), "banned")
            .add("users", "status", None, "ignored");

        let batches = coalescer.build();
        assert_eq!(batches.len(), 2);

        let active = batches
            .iter()
            .find(|batch| batch.values.get("status") == Some(&Bson::String("active".into())))
            .unwrap();
        assert_eq!(active.ids, vec![first, second]);
    }

    #[test]
    fn value_emits_every_assignment_even_without_net_change() {
        // No knowledge of committed state: assigning 0 is still a write.
        let id = Uuid::new();
        let mut coalescer = ValueCoalescer::new();
        coalescer.add("users", "score", Some(id), 0_i64);

        assert_eq!(coalescer.build().len(), 1);
    }

    #[test]
    fn batches_render_as_update_statements() {
        let id = Uuid::new();
        let mut coalescer = CounterCoalescer::new();
        coalescer.add("posts", "likes", Some(id), 3);

        let update = coalescer.build()[0].to_update();
        assert!(!update.is_empty());
    }
}
