//! Structural checksum engine over canonical values.
//!
//! The checksum engine turns a [`CanonicalValue`] into a deterministic
//! canonical string and a 128-bit digest. Digest equality is used as a cheap
//! proxy for deep structural equality: two views with the same flattened
//! content always produce the same digest, regardless of map entry order.

use md5::{Digest, Md5};

use crate::canonical::CanonicalValue;

/// Digest of the empty canonical form, i.e. MD5 of the empty string.
pub const EMPTY_DIGEST: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// Deterministic normalization and hashing over canonical values.
///
/// Both operations are pure functions of their input. [`Checksum::normalize`]
/// is exposed mainly for debugging and tests; callers interested in change
/// detection should compare [`Checksum::md5`] outputs.
pub struct Checksum;

impl Checksum {
    /// Renders the canonical serialized form of a value.
    ///
    /// Flattened `path:value` pairs are sorted by path using byte-wise string
    /// comparison and joined with `|`, no trailing separator. A null top-level
    /// value or a map with no entries short-circuits to the empty string
    /// without emitting any pair.
    pub fn normalize(value: &CanonicalValue) -> String {
        if value.is_empty() {
            return String::new();
        }

        value
            .flatten()
            .into_iter()
            .map(|(path, rendered)| format!("{path}:{rendered}"))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Computes the lowercase-hex MD5 digest of the normalized form.
    pub fn md5(value: &CanonicalValue) -> String {
        let mut hasher = Md5::new();
        hasher.update(Self::normalize(value).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn person(name: &str, family: &str) -> CanonicalValue {
        [
            ("Name".to_string(), CanonicalValue::from(name)),
            ("Family".to_string(), CanonicalValue::from(family)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn normalize_matches_reference_fixture() {
        let value: CanonicalValue = [
            ("A".to_string(), CanonicalValue::from("")),
            ("Var".to_string(), CanonicalValue::from(2_i64)),
            ("Ptr".to_string(), CanonicalValue::from(Some(2_i64))),
            (
                "Slice".to_string(),
                CanonicalValue::from(vec!["A", "b", "c"]),
            ),
            (
                "Persons".to_string(),
                CanonicalValue::Sequence(vec![person("John", "Doe"), person("Jack", "Ma")]),
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            Checksum::normalize(&value),
            "A:|Persons.E0.Family:Doe|Persons.E0.Name:John|Persons.E1.Family:Ma\
             |Persons.E1.Name:Jack|Ptr:2|Slice.E0:A|Slice.E1:b|Slice.E2:c|Var:2"
        );
        assert_eq!(Checksum::md5(&value), "1c4755dc74daa55c60657667a50a00fb");
    }

    #[test]
    fn normalize_is_deterministic() {
        let value: CanonicalValue = [
            ("b".to_string(), CanonicalValue::from(1_i64)),
            ("a".to_string(), CanonicalValue::from("x")),
        ]
        .into_iter()
        .collect();

        assert_eq!(Checksum::normalize(&value), Checksum::normalize(&value));
        assert_eq!(Checksum::normalize(&value), "a:x|b:1");
    }

    #[test]
    fn map_entry_order_does_not_matter() {
        let forward: CanonicalValue = [
            ("a".to_string(), CanonicalValue::from(1_i64)),
            ("b".to_string(), CanonicalValue::from(2_i64)),
        ]
        .into_iter()
        .collect();
        let backward: CanonicalValue = [
            ("b".to_string(), CanonicalValue::from(2_i64)),
            ("a".to_string(), CanonicalValue::from(1_i64)),
        ]
        .into_iter()
        .collect();

        assert_eq!(Checksum::md5(&forward), Checksum::md5(&backward));
    }

    #[test]
    fn sequence_order_does_matter() {
        let forward: CanonicalValue = [(
            "s".to_string(),
            CanonicalValue::from(vec!["a", "b"]),
        )]
        .into_iter()
        .collect();
        let backward: CanonicalValue = [(
            "s".to_string(),
            CanonicalValue::from(vec!["b", "a"]),
        )]
        .into_iter()
        .collect();

        assert_ne!(Checksum::md5(&forward), Checksum::md5(&backward));
    }

    #[test]
    fn empty_values_collapse_to_the_empty_digest() {
        assert_eq!(Checksum::normalize(&CanonicalValue::Null), "");
        assert_eq!(
            Checksum::normalize(&CanonicalValue::Map(BTreeMap::new())),
            ""
        );
        assert_eq!(Checksum::md5(&CanonicalValue::Null), EMPTY_DIGEST);
    }

    #[test]
    fn whole_floats_and_integers_collide() {
        let float_view: CanonicalValue =
            [("x".to_string(), CanonicalValue::from(2.0_f64))].into_iter().collect();
        let int_view: CanonicalValue =
            [("x".to_string(), CanonicalValue::from(2_i64))].into_iter().collect();

        assert_eq!(Checksum::normalize(&float_view), Checksum::normalize(&int_view));
    }
}
