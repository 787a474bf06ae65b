//! Query expression evaluation for in-memory record filtering.
//!
//! This module provides the evaluation engine for query expressions,
//! enabling filtering and comparison operations on BSON documents. Field
//! references are dotted paths resolved through nested documents.

use bson::{Bson, datetime::DateTime};
use std::{cmp::Ordering, collections::HashMap};

use recordlayer_core::{
    error::{StoreError, StoreResult},
    query::{Expr, FieldOp, QueryVisitor},
};

/// Resolves a dotted field path inside a BSON document.
///
/// Each path segment descends into a nested document; the lookup fails
/// (`None`) as soon as a segment is missing or the value at an intermediate
/// segment is not a document.
pub(crate) fn lookup_field<'a>(document: &'a Bson, path: &str) -> Option<&'a Bson> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

/// Type-erased, comparable representation of BSON values.
///
/// This enum wraps BSON values and provides comparison operations for
/// filtering queries. It normalizes numeric types to f64 for easy comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub(crate) struct RecordEvaluator<'a> {
    document: &'a Bson,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(document: &'a Bson) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> StoreResult<bool> {
        self.visit_expr(expr)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> StoreResult<Vec<Bson>> {
        let mut matched = Vec::new();
        for doc in documents {
            if RecordEvaluator::new(doc).evaluate(expr)? {
                matched.push(doc.clone());
            }
        }
        Ok(matched)
    }
}

impl<'a> QueryVisitor for RecordEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup_field(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        match lookup_field(self.document, field) {
            Some(field_value) => match op {
                FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
                FieldOp::Ne => Ok(Comparable::from(field_value) != Comparable::from(value)),
                FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                    match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                        Some(ordering) => Ok(match op {
                            FieldOp::Gt => ordering == Ordering::Greater,
                            FieldOp::Gte => ordering == Ordering::Greater || ordering == Ordering::Equal,
                            FieldOp::Lt => ordering == Ordering::Less,
                            FieldOp::Lte => ordering == Ordering::Less || ordering == Ordering::Equal,
                            _ => unreachable!(),
                        }),
                        None => Ok(false),
                    }
                },
                FieldOp::Contains => match Comparable::from(field_value) {
                    Comparable::Array(array) => Ok(
                        array
                            .iter()
                            .any(|item| item == &Comparable::from(value))
                    ),
                    Comparable::String(left) => match Comparable::from(value) {
                        Comparable::String(right) => Ok(left.contains(right)),
                        _ => Ok(false),
                    },
                    _ => Ok(false),
                },
                FieldOp::NotContains => match Comparable::from(field_value) {
                    Comparable::Array(array) => Ok(
                        !array
                            .iter()
                            .any(|item| item == &Comparable::from(value))
                    ),
                    Comparable::String(left) => match Comparable::from(value) {
                        Comparable::String(right) => Ok(!left.contains(right)),
                        _ => Ok(true),
                    },
                    _ => Ok(true),
                },
                FieldOp::StartsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::String(left), Comparable::String(right)) => Ok(left.starts_with(right)),
                    _ => Ok(false),
                },
                FieldOp::EndsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::String(left), Comparable::String(right)) => Ok(left.ends_with(right)),
                    _ => Ok(false),
                },
                FieldOp::AnyOf => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        for val in values {
                            if array.iter().any(|item| item == &val) {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    },
                    (Comparable::Array(array), single_value) => {
                        for item in array {
                            if item == single_value {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    },
                    (single_value, Comparable::Array(values)) => {
                        for val in values {
                            if val == single_value {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    },
                    _ => Ok(false),
                },
                FieldOp::NoneOf => match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::Array(array), Comparable::Array(values)) => {
                        for val in values {
                            if array.iter().any(|item| item == &val) {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    },
                    (Comparable::Array(array), single_value) => {
                        for item in array {
                            if item == single_value {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    },
                    (single_value, Comparable::Array(values)) => {
                        for val in values {
                            if val == single_value {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    },
                    _ => Ok(true),
                },
            },
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use recordlayer_core::query::Filter;

    fn sample() -> Bson {
        Bson::Document(doc! {
            "name": "Alice",
            "age": 30_i32,
            "tags": ["admin", "staff"],
            "profile": { "city": "Oslo" },
        })
    }

    fn matches(expr: &Expr) -> bool {
        RecordEvaluator::new(&sample()).evaluate(expr).unwrap()
    }

    #[test]
    fn dotted_paths_descend_into_nested_documents() {
        assert!(matches(&Filter::eq("profile.city", "Oslo")));
        assert!(!matches(&Filter::eq("profile.country", "Norway")));
        assert!(matches(&Filter::not_exists("profile.country")));
    }

    #[test]
    fn numeric_comparisons_span_integer_widths() {
        assert!(matches(&Filter::gt("age", 18_i64)));
        assert!(matches(&Filter::lte("age", 30.0)));
        assert!(!matches(&Filter::lt("age", 30_i32)));
    }

    #[test]
    fn contains_covers_arrays_and_strings() {
        assert!(matches(&Filter::contains("tags", "admin")));
        assert!(matches(&Filter::contains("name", "lic")));
        assert!(matches(&Filter::not_contains("tags", "guest")));
    }

    #[test]
    fn logical_combinators_compose() {
        let expr = Filter::eq("name", "Alice")
            .and(Filter::gt("age", 18))
            .or(Filter::eq("name", "Bob"));
        assert!(matches(&expr));
        assert!(!matches(&Filter::eq("name", "Alice").not()));
    }

    #[test]
    fn missing_field_never_matches_comparisons() {
        assert!(!matches(&Filter::eq("unknown", 1)));
        assert!(!matches(&Filter::gt("unknown", 1)));
    }

    #[test]
    fn filter_documents_keeps_only_matches() {
        let documents = vec![
            sample(),
            Bson::Document(doc! { "name": "Bob", "age": 10_i32 }),
        ];

        let matched =
            RecordEvaluator::filter_documents(&documents, &Filter::gte("age", 18)).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(
            lookup_field(&matched[0], "name"),
            Some(&Bson::String("Alice".into()))
        );
    }
}
