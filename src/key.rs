//! Filepath: src/key.rs
//!
//! Composite cache key used by the benchmark map.
//!
//! A [`CompositeKey`] is four immutable strings compared ordinally, ignoring
//! case. Every `char` is folded one-to-one to its simple uppercase form (see
//! [`fold_char`]); equality and hashing walk the same folded stream, so two
//! keys that compare equal always hash equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Written after each field while hashing so that `("ab", "c")` and
/// `("a", "bc")` feed different streams to the hasher.
const FIELD_SEPARATOR: u8 = 0xff;

/// An immutable four-field key with case-insensitive value equality.
///
/// Fields are stored as `Arc<str>`: keys built from the same tag share one
/// allocation, and cloning a key (done when the map grows) never copies
/// string data.
///
/// # Example
///
/// ```rust
/// use valuescan::key::CompositeKey;
///
/// let a = CompositeKey::new("Order-7", "Line-1", "en-us", "web");
/// let b = CompositeKey::new("ORDER-7", "line-1", "EN-US", "Web");
/// assert_eq!(a, b);
///
/// let c = CompositeKey::new("Order-7", "Line-2", "en-us", "web");
/// assert_ne!(a, c);
/// ```
#[derive(Clone, Debug)]
pub struct CompositeKey {
    object1_id: Arc<str>,
    object2_id: Arc<str>,
    language: Arc<str>,
    database: Arc<str>,
}

impl CompositeKey {
    /// Create a key from its four fields.
    ///
    /// Never fails: empty and repeated strings are valid field values.
    #[must_use]
    pub fn new(
        object1_id: impl Into<Arc<str>>,
        object2_id: impl Into<Arc<str>>,
        language: impl Into<Arc<str>>,
        database: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            object1_id: object1_id.into(),
            object2_id: object2_id.into(),
            language: language.into(),
            database: database.into(),
        }
    }

    /// First object identifier.
    #[must_use]
    #[inline]
    pub fn object1_id(&self) -> &str {
        &self.object1_id
    }

    /// Second object identifier.
    #[must_use]
    #[inline]
    pub fn object2_id(&self) -> &str {
        &self.object2_id
    }

    /// Language tag.
    #[must_use]
    #[inline]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Database tag.
    #[must_use]
    #[inline]
    pub fn database(&self) -> &str {
        &self.database
    }

    fn fields(&self) -> [&str; 4] {
        [
            &*self.object1_id,
            &*self.object2_id,
            &*self.language,
            &*self.database,
        ]
    }
}

/// Simple (one-to-one) uppercase mapping of `c`.
///
/// A `char` whose full uppercase form is longer than one `char` (`ß`, `ﬀ`)
/// folds to itself, so folding never changes the length of a string.
#[inline]
fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Ordinal case-insensitive string equality.
///
/// ASCII inputs take the byte-wise path. Anything else is compared `char` by
/// `char` on [`fold_char`], the same stream [`hash_folded`] feeds the hasher.
#[inline]
fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }

    a.chars().map(fold_char).eq(b.chars().map(fold_char))
}

#[inline]
fn hash_folded<H: Hasher>(s: &str, state: &mut H) {
    if s.is_ascii() {
        // Identical to the `char` path below for ASCII, one byte at a time.
        for byte in s.bytes() {
            state.write_u32(u32::from(byte.to_ascii_uppercase()));
        }
    } else {
        for c in s.chars().map(fold_char) {
            state.write_u32(u32::from(c));
        }
    }
    state.write_u8(FIELD_SEPARATOR);
}

impl PartialEq for CompositeKey {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        self.fields()
            .iter()
            .zip(other.fields())
            .all(|(a, b)| eq_ignore_case(a, b))
    }
}

impl Eq for CompositeKey {}

impl Hash for CompositeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for field in self.fields() {
            hash_folded(field, state);
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-",
            self.database, self.object1_id, self.language, self.object2_id
        )
    }
}
