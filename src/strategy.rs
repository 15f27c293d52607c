//! Filepath: src/strategy.rs
//!
//! The two "read all values" strategies measured by the harness.
//!
//! Both sit behind one capability, [`ReadStrategy::read`], which turns a map
//! into a sequence of its values:
//!
//! | Strategy | Map operation | Locks | Materialized |
//! |----------|---------------|-------|--------------|
//! | [`Snapshot`](ReadStrategy::Snapshot) | [`ConcurrentMap::snapshot_values`] | every segment, while copying | yes |
//! | [`Projection`](ReadStrategy::Projection) | [`ConcurrentMap::values`] | none | no, lazy |

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::vec;

use crate::map::{ConcurrentMap, MapGuard, Values};

/// A way of reading every value out of a [`ConcurrentMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadStrategy {
    /// Locks every segment and copies all values into a `Vec`.
    Snapshot,
    /// Walks the map lock-free, yielding each value as its entry is visited.
    Projection,
}

impl ReadStrategy {
    /// Strategies in the order the harness measures them.
    pub const ALL: [Self; 2] = [Self::Snapshot, Self::Projection];

    /// Short machine-friendly name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Projection => "projection",
        }
    }

    /// Whether a read blocks writers and other snapshot readers.
    #[must_use]
    pub const fn locks(self) -> bool {
        matches!(self, Self::Snapshot)
    }

    /// One-line human description, shown in the banner and phase headers.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Snapshot => {
                "map.snapshot_values() - LOCKS every segment while copying all values"
            }
            Self::Projection => {
                "map.values(&guard) - does NOT lock; lazily projects each entry to its value"
            }
        }
    }

    /// Read every value of `map`.
    ///
    /// For [`Snapshot`](Self::Snapshot) the copy is complete when this returns;
    /// for [`Projection`](Self::Projection) the work happens while iterating.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was created by a different map.
    pub fn read<'g, K, V, S>(
        self,
        map: &'g ConcurrentMap<K, V, S>,
        guard: &'g MapGuard<'g>,
    ) -> ReadValues<'g, K, V>
    where
        K: Hash + Eq,
        V: Clone,
        S: BuildHasher,
    {
        match self {
            Self::Snapshot => ReadValues::Snapshot(map.snapshot_values().into_iter()),
            Self::Projection => ReadValues::Projection(map.values(guard)),
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sequence of values returned by [`ReadStrategy::read`].
pub enum ReadValues<'g, K, V> {
    /// A fully materialized copy.
    Snapshot(vec::IntoIter<V>),
    /// A lazy lock-free traversal.
    Projection(Values<'g, K, V>),
}

impl<K, V: Clone> Iterator for ReadValues<'_, K, V> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<V> {
        match self {
            Self::Snapshot(values) => values.next(),
            Self::Projection(values) => values.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Snapshot(values) => values.size_hint(),
            Self::Projection(_) => (0, None),
        }
    }
}

impl<K, V: Clone> FusedIterator for ReadValues<'_, K, V> {}

impl<K, V> fmt::Debug for ReadValues<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(values) => f
                .debug_struct("Snapshot")
                .field("remaining", &values.len())
                .finish(),
            Self::Projection(_) => f.debug_struct("Projection").finish_non_exhaustive(),
        }
    }
}
