//! Property-based tests for the `key` module.
//!
//! These tests verify the equality/hash contract of `CompositeKey` for all
//! generated inputs.

use proptest::prelude::*;
use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher};
use valuescan::key::CompositeKey;

// ============================================================================
//  Strategies
// ============================================================================

/// Strategy for ASCII field content, including the empty string.
fn field() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9-]{0,24}"
}

/// Strategy for four fields.
fn fields() -> impl Strategy<Value = [String; 4]> {
    prop::array::uniform4(field())
}

/// Strategy for mixed-script content: letters with one-to-one case pairs next
/// to letters whose uppercase form is longer than one `char`.
fn unicode_field() -> impl Strategy<Value = String> {
    "[a-zA-ZäÄöÖéÉßẞσΣςİıﬀfFsS0-9-]{0,12}"
}

/// Strategy for four mixed-script fields.
fn unicode_fields() -> impl Strategy<Value = [String; 4]> {
    prop::array::uniform4(unicode_field())
}

/// Reference fold: uppercase a `char` only when that yields a single `char`.
fn simple_upper(c: char) -> char {
    let upper: Vec<char> = c.to_uppercase().collect();
    if upper.len() == 1 { upper[0] } else { c }
}

fn folded(s: &str) -> String {
    s.chars().map(simple_upper).collect()
}

/// Randomly flip the case of each ASCII letter.
fn recase(s: &str, flips: &[bool]) -> String {
    s.chars()
        .zip(flips.iter().cycle())
        .map(|(c, &flip)| {
            if flip {
                if c.is_ascii_lowercase() {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            } else {
                c
            }
        })
        .collect()
}

fn key(f: &[String; 4]) -> CompositeKey {
    CompositeKey::new(f[0].as_str(), f[1].as_str(), f[2].as_str(), f[3].as_str())
}

fn hash_of(key: &CompositeKey) -> u64 {
    BuildHasherDefault::<DefaultHasher>::default().hash_one(key)
}

// ============================================================================
//  Equality / Hash Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A key is equal to itself and to a clone.
    #[test]
    fn key_equals_itself(f in fields()) {
        let k = key(&f);
        prop_assert_eq!(&k, &k.clone());
        prop_assert_eq!(hash_of(&k), hash_of(&k.clone()));
    }

    /// Re-casing any field keeps the key equal and the hash identical.
    #[test]
    fn recased_keys_are_equal(
        f in fields(),
        flips in prop::collection::vec(any::<bool>(), 1..8)
    ) {
        let recased: [String; 4] = [
            recase(&f[0], &flips),
            recase(&f[1], &flips),
            recase(&f[2], &flips),
            recase(&f[3], &flips),
        ];
        let a = key(&f);
        let b = key(&recased);

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }

    /// Changing the content of any one field makes the keys unequal.
    #[test]
    fn changed_field_makes_keys_unequal(
        f in fields(),
        which in 0usize..4,
        extra in "[a-z0-9]{1,4}"
    ) {
        let mut changed = f.clone();
        changed[which].push_str(&extra);

        prop_assert_ne!(key(&f), key(&changed));
    }

    /// Equality agrees with ASCII case-insensitive comparison of every field.
    #[test]
    fn equality_matches_fieldwise_comparison(a in fields(), b in fields()) {
        let expected = a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| x.eq_ignore_ascii_case(y));

        prop_assert_eq!(key(&a) == key(&b), expected);
        if expected {
            prop_assert_eq!(hash_of(&key(&a)), hash_of(&key(&b)));
        }
    }

    /// Non-ASCII equality agrees with a `char`-by-`char` simple uppercase
    /// comparison, and equal keys hash equal.
    #[test]
    fn unicode_equality_matches_simple_fold(a in unicode_fields(), b in unicode_fields()) {
        let expected = a.iter().zip(b.iter()).all(|(x, y)| folded(x) == folded(y));

        prop_assert_eq!(key(&a) == key(&b), expected);
        if expected {
            prop_assert_eq!(hash_of(&key(&a)), hash_of(&key(&b)));
        }
    }

    /// A key equals the key built from its folded fields.
    #[test]
    fn unicode_key_equals_its_fold(f in unicode_fields()) {
        let upper: [String; 4] = [folded(&f[0]), folded(&f[1]), folded(&f[2]), folded(&f[3])];

        prop_assert_eq!(key(&f), key(&upper));
        prop_assert_eq!(hash_of(&key(&f)), hash_of(&key(&upper)));
    }

    /// Folding never changes how many `char`s a field has, so a field never
    /// equals its full (expanding) uppercase form when that is longer.
    #[test]
    fn expansion_is_never_equal(f in unicode_field()) {
        let expanded = f.to_uppercase();
        if expanded.chars().count() != f.chars().count() {
            prop_assert_ne!(
                CompositeKey::new(f.as_str(), "x", "en-us", "web"),
                CompositeKey::new(expanded.as_str(), "x", "en-us", "web")
            );
        }
    }

    /// Content moved between adjacent fields never produces an equal key.
    #[test]
    fn field_boundaries_are_respected(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let joined_left = CompositeKey::new(format!("{a}{b}"), "", "en-us", "web");
        let split = CompositeKey::new(a.as_str(), b.as_str(), "en-us", "web");

        prop_assert_ne!(joined_left, split);
    }

    /// Display joins the fields in database/object1/language/object2 order.
    #[test]
    fn display_layout(f in fields()) {
        let k = key(&f);
        prop_assert_eq!(k.to_string(), format!("{}-{}-{}-{}-", f[3], f[0], f[2], f[1]));
    }
}
