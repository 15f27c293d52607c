//! Filepath: src/map/table.rs
//!
//! Bucket array and chain nodes backing [`ConcurrentMap`](super::ConcurrentMap).
//!
//! A [`Table`] is an array of bucket heads. Each bucket is a singly linked
//! chain of [`Node`]s. Nodes are never modified after publication except for
//! their `next` link, which a writer may redirect (under the owning segment
//! lock) to splice in a replacement node.
//!
//! # Ownership
//! A table owns every node reachable from its buckets and frees them on drop.
//! A node that was spliced out of a chain is owned by whoever retired it.

use std::ptr as StdPtr;
use std::sync::atomic::AtomicPtr;

use crate::ordering::RELAXED;

/// Smallest bucket count a table is created with.
pub(crate) const MIN_BUCKETS: usize = 16;

/// A single chain entry.
pub(crate) struct Node<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: AtomicPtr<Node<K, V>>,
}

impl<K, V> Node<K, V> {
    /// Allocate a node and leak it as a raw pointer ready for publication.
    pub(crate) fn alloc(hash: u64, key: K, value: V, next: *mut Self) -> *mut Self {
        Box::into_raw(Box::new(Self {
            hash,
            key,
            value,
            next: AtomicPtr::new(next),
        }))
    }
}

/// Power-of-two array of bucket heads.
pub(crate) struct Table<K, V> {
    buckets: Box<[AtomicPtr<Node<K, V>>]>,
    mask: usize,
}

impl<K, V> Table<K, V> {
    /// Create an empty table with at least `buckets` buckets.
    pub(crate) fn new(buckets: usize) -> Self {
        let len: usize = buckets.max(MIN_BUCKETS).next_power_of_two();
        let buckets: Box<[AtomicPtr<Node<K, V>>]> = (0..len)
            .map(|_| AtomicPtr::new(StdPtr::null_mut()))
            .collect();

        Self {
            buckets,
            mask: len - 1,
        }
    }

    /// Allocate an empty table on the heap, returning the raw pointer.
    pub(crate) fn alloc(buckets: usize) -> *mut Self {
        Box::into_raw(Box::new(Self::new(buckets)))
    }

    /// Number of buckets.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket index for `hash`.
    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "only the low bits select a bucket"
    )]
    pub(crate) const fn bucket_index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Head of bucket `index`.
    #[inline]
    pub(crate) fn head(&self, index: usize) -> &AtomicPtr<Node<K, V>> {
        &self.buckets[index]
    }

    /// Entries a single segment may hold before the table should grow.
    ///
    /// Keeps the average chain length around one.
    #[inline]
    pub(crate) fn segment_budget(&self, segments: usize) -> usize {
        (self.len() / segments).max(1)
    }
}

impl<K, V> Drop for Table<K, V> {
    fn drop(&mut self) {
        // Exclusive access: either the owning map is dropping, or the table was
        // retired and no guard can still reach it.
        for head in &*self.buckets {
            let mut cur: *mut Node<K, V> = head.load(RELAXED);
            while !cur.is_null() {
                // SAFETY: every node in a chain came from `Node::alloc` and is
                // owned by this table.
                let node: Box<Node<K, V>> = unsafe { Box::from_raw(cur) };
                cur = node.next.load(RELAXED);
            }
        }
    }
}
