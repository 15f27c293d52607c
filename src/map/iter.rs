//! Filepath: src/map/iter.rs
//!
//! Lock-free traversal over a published table.
//!
//! [`Iter`] walks the buckets of the table that was current when it was
//! created. It takes no segment lock, so it never blocks writers or other
//! readers. The borrowed guard keeps every node it can reach alive, even if a
//! writer replaces the node or the whole table while the traversal runs.
//!
//! The result is not a point-in-time snapshot: a concurrent writer that links
//! a node into a bucket that has not been visited yet is observed, one that
//! links into an already visited bucket is not.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr as StdPtr;

use seize::{Guard, LocalGuard};

use super::table::{Node, Table};
use crate::ordering::READ_ORD;

/// Lazy iterator over `(&K, &V)` pairs, created by
/// [`ConcurrentMap::iter`](super::ConcurrentMap::iter).
pub struct Iter<'g, K, V> {
    table: &'g Table<K, V>,
    guard: &'g LocalGuard<'g>,
    bucket: usize,
    node: *const Node<K, V>,
    _marker: PhantomData<(&'g K, &'g V)>,
}

impl<'g, K, V> Iter<'g, K, V> {
    pub(crate) fn new(table: &'g Table<K, V>, guard: &'g LocalGuard<'g>) -> Self {
        Self {
            table,
            guard,
            bucket: 0,
            node: StdPtr::null(),
            _marker: PhantomData,
        }
    }
}

impl<'g, K, V> Iterator for Iter<'g, K, V> {
    type Item = (&'g K, &'g V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.node.is_null() {
            if self.bucket == self.table.len() {
                return None;
            }

            self.node = self.guard.protect(self.table.head(self.bucket), READ_ORD);
            self.bucket += 1;
        }

        // SAFETY: `node` was loaded through the guard from a chain of a table
        // the guard also protects; it stays allocated for `'g`.
        let node: &'g Node<K, V> = unsafe { &*self.node };
        self.node = self.guard.protect(&node.next, READ_ORD);

        Some((&node.key, &node.value))
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Lazy projection of a map onto its values, created by
/// [`ConcurrentMap::values`](super::ConcurrentMap::values).
///
/// Each value is cloned out at the moment its entry is visited.
pub struct Values<'g, K, V> {
    inner: Iter<'g, K, V>,
}

impl<'g, K, V> Values<'g, K, V> {
    pub(crate) const fn new(inner: Iter<'g, K, V>) -> Self {
        Self { inner }
    }
}

impl<K, V: Clone> Iterator for Values<'_, K, V> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, value)| value.clone())
    }
}

impl<K, V: Clone> FusedIterator for Values<'_, K, V> {}
