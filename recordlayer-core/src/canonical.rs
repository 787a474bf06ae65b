//! Canonical value representation for structural change detection.
//!
//! Records that want checksum-based change detection expose a *comparable
//! view*: a [`CanonicalValue`] tree built from the fields that count as
//! meaningful content. The canonicalizer flattens that tree into a sorted
//! set of `path -> rendered scalar` pairs which the checksum engine turns
//! into a digest (see [`crate::checksum`]).
//!
//! The type is a closed sum over the shapes a document value can take, so
//! flattening needs no runtime type inspection and cyclic views are
//! unrepresentable by construction.

use bson::Bson;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A closed, owned representation of a nested document value.
///
/// Comparable views are converted into this type via the `From` impls below
/// (primitives, options, sequences, maps, and whole [`Bson`] values), then
/// flattened for hashing.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    /// Absent or explicit null.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Int(i64),
    /// Unsigned integer scalar.
    UInt(u64),
    /// Floating point scalar. Rendered rounded to zero decimal digits:
    /// checksums are deliberately insensitive to fractional precision.
    Float(f64),
    /// String scalar. The empty string renders identically to null.
    String(String),
    /// Ordered sequence; element order is significant.
    Sequence(Vec<CanonicalValue>),
    /// Keyed map; entry order is not significant.
    Map(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Returns true for the views that disable change gating: null and the
    /// map with no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            CanonicalValue::Null => true,
            CanonicalValue::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Flattens this value into sorted `path -> rendered scalar` pairs.
    ///
    /// Paths join segments with `.`; sequence elements use `E<index>`
    /// segments starting at zero. Null, absent options and empty strings all
    /// render as the empty string but are still emitted under their path;
    /// the only paths missing from the output are those never visited, which
    /// happens solely for empty sequences and empty maps.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, path: &str, out: &mut BTreeMap<String, String>) {
        match self {
            CanonicalValue::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    item.flatten_into(&join_path(path, &format!("E{index}")), out);
                }
            }
            CanonicalValue::Map(entries) => {
                for (key, value) in entries {
                    value.flatten_into(&join_path(path, key), out);
                }
            }
            scalar => {
                out.insert(path.to_string(), scalar.render());
            }
        }
    }

    /// Renders a scalar variant to its canonical text form. Sequences and
    /// maps never reach this point during flattening.
    fn render(&self) -> String {
        match self {
            CanonicalValue::Null => String::new(),
            CanonicalValue::Bool(value) => value.to_string(),
            CanonicalValue::Int(value) => value.to_string(),
            CanonicalValue::UInt(value) => value.to_string(),
            // Rounded, not truncated: 2.5 and 2 must collide.
            CanonicalValue::Float(value) => format!("{value:.0}"),
            CanonicalValue::String(value) => value.clone(),
            CanonicalValue::Sequence(_) | CanonicalValue::Map(_) => String::new(),
        }
    }
}

fn join_path(root: &str, segment: &str) -> String {
    if root.is_empty() {
        segment.to_string()
    } else {
        format!("{root}.{segment}")
    }
}

impl From<bool> for CanonicalValue {
    fn from(value: bool) -> Self {
        CanonicalValue::Bool(value)
    }
}

macro_rules! canonical_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for CanonicalValue {
            fn from(value: $ty) -> Self {
                CanonicalValue::Int(value as i64)
            }
        })*
    };
}

macro_rules! canonical_from_uint {
    ($($ty:ty),*) => {
        $(impl From<$ty> for CanonicalValue {
            fn from(value: $ty) -> Self {
                CanonicalValue::UInt(value as u64)
            }
        })*
    };
}

canonical_from_int!(i8, i16, i32, i64);
canonical_from_uint!(u8, u16, u32, u64);

impl From<f32> for CanonicalValue {
    fn from(value: f32) -> Self {
        CanonicalValue::Float(value as f64)
    }
}

impl From<f64> for CanonicalValue {
    fn from(value: f64) -> Self {
        CanonicalValue::Float(value)
    }
}

impl From<&str> for CanonicalValue {
    fn from(value: &str) -> Self {
        CanonicalValue::String(value.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(value: String) -> Self {
        CanonicalValue::String(value)
    }
}

impl From<DateTime<Utc>> for CanonicalValue {
    fn from(value: DateTime<Utc>) -> Self {
        CanonicalValue::String(value.to_rfc3339())
    }
}

impl<T: Into<CanonicalValue>> From<Option<T>> for CanonicalValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => CanonicalValue::Null,
        }
    }
}

impl<T: Into<CanonicalValue>> From<Vec<T>> for CanonicalValue {
    fn from(items: Vec<T>) -> Self {
        CanonicalValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CanonicalValue>> From<BTreeMap<String, T>> for CanonicalValue {
    fn from(entries: BTreeMap<String, T>) -> Self {
        CanonicalValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        )
    }
}

impl FromIterator<(String, CanonicalValue)> for CanonicalValue {
    fn from_iter<I: IntoIterator<Item = (String, CanonicalValue)>>(entries: I) -> Self {
        CanonicalValue::Map(entries.into_iter().collect())
    }
}

impl From<&Bson> for CanonicalValue {
    fn from(bson: &Bson) -> Self {
        match bson {
            Bson::Null => CanonicalValue::Null,
            Bson::Boolean(value) => CanonicalValue::Bool(*value),
            Bson::Int32(value) => CanonicalValue::Int(*value as i64),
            Bson::Int64(value) => CanonicalValue::Int(*value),
            Bson::Double(value) => CanonicalValue::Float(*value),
            Bson::String(value) => CanonicalValue::String(value.clone()),
            Bson::DateTime(value) => CanonicalValue::String(value.to_chrono().to_rfc3339()),
            Bson::ObjectId(value) => CanonicalValue::String(value.to_hex()),
            Bson::Array(items) => {
                CanonicalValue::Sequence(items.iter().map(CanonicalValue::from).collect())
            }
            Bson::Document(doc) => CanonicalValue::Map(
                doc.iter()
                    .map(|(key, value)| (key.to_string(), CanonicalValue::from(value)))
                    .collect(),
            ),
            // Remaining kinds are opaque scalars: a stable string rendering
            // keeps them digest-able without strict typing.
            other => CanonicalValue::String(other.to_string()),
        }
    }
}

impl From<Bson> for CanonicalValue {
    fn from(bson: Bson) -> Self {
        CanonicalValue::from(&bson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn flatten_emits_empty_scalars_under_their_path() {
        let value: CanonicalValue = [
            ("a".to_string(), CanonicalValue::from("")),
            ("b".to_string(), CanonicalValue::Null),
            ("c".to_string(), CanonicalValue::from(None::<i64>)),
        ]
        .into_iter()
        .collect();

        let flat = value.flatten();
        assert_eq!(flat.get("a"), Some(&String::new()));
        assert_eq!(flat.get("b"), Some(&String::new()));
        assert_eq!(flat.get("c"), Some(&String::new()));
    }

    #[test]
    fn flatten_skips_empty_collections_entirely() {
        let value: CanonicalValue = [
            ("items".to_string(), CanonicalValue::Sequence(Vec::new())),
            ("tags".to_string(), CanonicalValue::Map(BTreeMap::new())),
            ("name".to_string(), CanonicalValue::from("x")),
        ]
        .into_iter()
        .collect();

        let flat = value.flatten();
        assert_eq!(flat.len(), 1);
        assert!(flat.contains_key("name"));
    }

    #[test]
    fn sequence_elements_are_indexed_in_order() {
        let value: CanonicalValue = [(
            "s".to_string(),
            CanonicalValue::from(vec!["A", "b", "c"]),
        )]
        .into_iter()
        .collect();

        let flat = value.flatten();
        assert_eq!(flat.get("s.E0").map(String::as_str), Some("A"));
        assert_eq!(flat.get("s.E1").map(String::as_str), Some("b"));
        assert_eq!(flat.get("s.E2").map(String::as_str), Some("c"));
    }

    #[test]
    fn floats_render_rounded_to_nearest_integer() {
        assert_eq!(CanonicalValue::Float(2.0).render(), "2");
        assert_eq!(CanonicalValue::Float(2.7).render(), "3");
        assert_eq!(CanonicalValue::Float(-1.6).render(), "-2");
        assert_eq!(CanonicalValue::Int(2).render(), "2");
    }

    #[test]
    fn bson_documents_convert_structurally() {
        let bson = Bson::Document(doc! {
            "name": "John",
            "age": 42_i32,
            "scores": [1_i64, 2_i64],
            "missing": Bson::Null,
        });

        let flat = CanonicalValue::from(&bson).flatten();
        assert_eq!(flat.get("name").map(String::as_str), Some("John"));
        assert_eq!(flat.get("age").map(String::as_str), Some("42"));
        assert_eq!(flat.get("scores.E0").map(String::as_str), Some("1"));
        assert_eq!(flat.get("scores.E1").map(String::as_str), Some("2"));
        assert_eq!(flat.get("missing").map(String::as_str), Some(""));
    }

    #[test]
    fn emptiness_is_null_or_empty_map() {
        assert!(CanonicalValue::Null.is_empty());
        assert!(CanonicalValue::Map(BTreeMap::new()).is_empty());
        assert!(!CanonicalValue::Sequence(Vec::new()).is_empty());
        assert!(!CanonicalValue::from("").is_empty());
    }
}
