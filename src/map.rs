//! Filepath: src/map.rs
//!
//! Segmented concurrent hash map with two "read all values" paths.
//!
//! # Layout
//! - A fixed, power-of-two set of **segments**. Each segment is a mutex that
//!   guards every bucket whose index maps to it (`bucket & segment_mask`) and
//!   holds the number of entries stored in those buckets.
//! - A **table** of bucket heads published through an `AtomicPtr`. Buckets are
//!   chains of immutable nodes (see [`table`]).
//! - A [`seize::Collector`] for memory reclamation. Replaced nodes and
//!   superseded tables are retired, never freed in place.
//!
//! # Concurrency Model
//! 1. Writers lock the segment of their bucket, re-check that the table they
//!    hashed into is still published, link a node, and unlock.
//! 2. Growth and [`clear`](ConcurrentMap::clear) lock every segment in index
//!    order, publish a new table, and retire the old one.
//! 3. Lock-free readers enter a [`MapGuard`], load the table and walk chains
//!    with Acquire loads. They never take a segment lock.
//!
//! # Reading Every Value
//! - [`snapshot_values`](ConcurrentMap::snapshot_values) locks all segments,
//!   copies every value into a `Vec`, and unlocks. The copy is a consistent
//!   point-in-time snapshot; inserts, growth and other snapshot reads wait
//!   for it.
//! - [`values`](ConcurrentMap::values) is a lazy projection over the
//!   lock-free traversal. It never blocks anyone and is not a point-in-time
//!   snapshot when writers run concurrently.
//!
//! ```rust
//! use valuescan::map::ConcurrentMap;
//!
//! let map: ConcurrentMap<u64, bool> = ConcurrentMap::new();
//! assert!(map.try_insert(1, false));
//! assert!(!map.try_insert(1, true));
//!
//! let snapshot = map.snapshot_values();
//! let guard = map.guard();
//! let projected: Vec<bool> = map.values(&guard).collect();
//! assert_eq!(snapshot, projected);
//! ```

mod iter;
mod table;


use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash, RandomState};
use std::marker::PhantomData;
use std::ptr as StdPtr;
use std::sync::atomic::AtomicPtr;

use parking_lot::{Mutex, MutexGuard};
use seize::{Collector, Guard, LocalGuard};

pub use iter::{Iter, Values};
use table::{Node, Table};

use crate::ordering::{READ_ORD, RELAXED, WRITE_ORD};
use crate::tracing_helpers::{debug_log, trace_log};

/// Segments created per unit of available parallelism.
const SEGMENTS_PER_CPU: usize = 4;

/// Segment count used when available parallelism cannot be queried.
const FALLBACK_SEGMENTS: usize = 16;

/// Default number of segments for [`ConcurrentMap::new`].
///
/// Scales with the machine so that writers on different cores rarely share a
/// segment. Always a power of two.
#[must_use]
pub fn default_segments() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_SEGMENTS, |n| {
        (n.get() * SEGMENTS_PER_CPU).next_power_of_two()
    })
}

/// Reclamation guard for a single [`ConcurrentMap`].
///
/// Any node or table reached while the guard is alive stays allocated until
/// the guard drops. Obtained from [`ConcurrentMap::guard`]; passing it to a
/// different map panics.
pub struct MapGuard<'m> {
    inner: LocalGuard<'m>,
    owner: *const Collector,
}

impl MapGuard<'_> {
    /// Leave and re-enter the protected region.
    ///
    /// Tables and nodes retired while this guard was held can be freed once it
    /// refreshes. Anything read through the guard must not be used afterwards,
    /// which the `&mut self` receiver enforces.
    #[inline]
    pub fn refresh(&mut self) {
        self.inner.refresh();
    }
}

impl fmt::Debug for MapGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapGuard").finish_non_exhaustive()
    }
}

/// A segmented, lock-striped concurrent hash map.
///
/// See the [module documentation](self) for the concurrency model.
pub struct ConcurrentMap<K, V, S = RandomState> {
    table: AtomicPtr<Table<K, V>>,
    segments: Box<[Mutex<usize>]>,
    segment_mask: usize,
    initial_buckets: usize,
    hasher: S,
    collector: Collector,
    _marker: PhantomData<*const (K, V)>,
}

// SAFETY: keys and values are reached from any thread through `&self`, and a
// retired node or table may be dropped by whichever thread reclaims it.
unsafe impl<K: Send + Sync, V: Send + Sync, S: Send> Send for ConcurrentMap<K, V, S> {}

// SAFETY: see `Send`; shared access hands out `&K`/`&V` to many threads.
unsafe impl<K: Send + Sync, V: Send + Sync, S: Sync> Sync for ConcurrentMap<K, V, S> {}

impl<K, V> ConcurrentMap<K, V> {
    /// Create an empty map with [`default_segments`] segments.
    #[must_use]
    pub fn new() -> Self {
        Self::with_segments(default_segments())
    }

    /// Create an empty map with `segments` segments (rounded up to a power of two).
    #[must_use]
    pub fn with_segments(segments: usize) -> Self {
        Self::with_capacity_and_segments(0, segments)
    }

    /// Create an empty map sized for `capacity` entries without growing.
    #[must_use]
    pub fn with_capacity_and_segments(capacity: usize, segments: usize) -> Self {
        Self::with_capacity_segments_and_hasher(capacity, segments, RandomState::new())
    }
}

impl<K, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S> {
    /// Create an empty map that hashes keys with `hasher`.
    #[must_use]
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_segments_and_hasher(0, default_segments(), hasher)
    }

    /// Create an empty map with explicit capacity, segment count and hasher.
    ///
    /// `segments` is clamped to at least one and rounded up to a power of two.
    #[must_use]
    pub fn with_capacity_segments_and_hasher(capacity: usize, segments: usize, hasher: S) -> Self {
        let segments: usize = segments.max(1).next_power_of_two();
        let initial_buckets: usize = capacity.max(segments);

        Self {
            table: AtomicPtr::new(Table::alloc(initial_buckets)),
            segments: (0..segments).map(|_| Mutex::new(0)).collect(),
            segment_mask: segments - 1,
            initial_buckets,
            hasher,
            collector: Collector::new(),
            _marker: PhantomData,
        }
    }

    /// Enter a protected region and return a guard.
    ///
    /// The guard protects any node loaded during its lifetime from being
    /// reclaimed. Required by the lock-free read methods.
    #[must_use]
    #[inline]
    pub fn guard(&self) -> MapGuard<'_> {
        MapGuard {
            inner: self.collector.enter(),
            owner: &self.collector,
        }
    }

    /// Number of segments (lock stripes).
    #[must_use]
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of buckets in the currently published table.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        let guard = self.guard();
        self.load_table(&guard).len()
    }

    /// Number of entries.
    ///
    /// Locks every segment to sum a consistent count, so it blocks writers
    /// for the duration of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_all().iter().map(|count| **count).sum()
    }

    /// Check if the map is empty. Locks every segment, like [`len`](Self::len).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock-free iterator over `(&K, &V)` pairs of the current table.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was created by a different map.
    #[must_use]
    pub fn iter<'g>(&'g self, guard: &'g MapGuard<'g>) -> Iter<'g, K, V> {
        let table: &'g Table<K, V> = self.load_table(guard);
        Iter::new(table, &guard.inner)
    }

    /// Projected view: lazily maps every live entry to its value.
    ///
    /// Takes no segment lock and never blocks writers or other readers. Every
    /// entry present when the traversal starts is yielded exactly once if no
    /// writer runs concurrently; with concurrent writers the result is not a
    /// single point-in-time snapshot. Each call re-scans the map.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was created by a different map.
    #[must_use]
    pub fn values<'g>(&'g self, guard: &'g MapGuard<'g>) -> Values<'g, K, V> {
        Values::new(self.iter(guard))
    }

    /// Snapshot read: copies every value while holding all segment locks.
    ///
    /// The returned vector is a consistent point-in-time copy. While it is
    /// being built, no insert, growth, clear or other snapshot read can
    /// proceed on any segment.
    #[must_use]
    pub fn snapshot_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let counts = self.lock_all();
        let total: usize = counts.iter().map(|count| **count).sum();

        // SAFETY: all segment locks are held, so the table can be neither
        // replaced nor retired and no chain can change until `counts` drops.
        let table: &Table<K, V> = unsafe { &*self.table.load(READ_ORD) };

        let mut out: Vec<V> = Vec::with_capacity(total);
        for index in 0..table.len() {
            let mut cur: *mut Node<K, V> = table.head(index).load(RELAXED);
            while !cur.is_null() {
                // SAFETY: nodes reachable from the locked table are live.
                let node: &Node<K, V> = unsafe { &*cur };
                out.push(node.value.clone());
                cur = node.next.load(RELAXED);
            }
        }

        debug_assert_eq!(out.len(), total, "segment counts out of sync with chains");
        drop(counts);
        out
    }

    /// Remove every entry.
    ///
    /// Publishes a fresh empty table under all segment locks. Readers already
    /// traversing the old table finish on it undisturbed.
    pub fn clear(&self) {
        let guard = self.guard();
        let mut counts = self.lock_all();

        let old_ptr: *mut Table<K, V> = self.table.load(RELAXED);
        self.table
            .store(Table::alloc(self.initial_buckets), WRITE_ORD);
        for count in &mut counts {
            **count = 0;
        }
        drop(counts);

        trace_log!(segments = self.segments.len(), "map cleared");

        // SAFETY: `old_ptr` is unpublished; guards that loaded it keep it alive.
        unsafe {
            guard.inner.defer_retire(old_ptr, |ptr, _| {
                drop(Box::from_raw(ptr));
            });
        }
        // A superseded table holds a clone of every entry. Hand it to the
        // collector now instead of waiting for a full batch.
        guard.inner.flush();
    }

    // ========================================================================
    //  Internal Helpers
    // ========================================================================

    #[inline]
    fn check_guard(&self, guard: &MapGuard<'_>) {
        assert!(
            StdPtr::eq(guard.owner, &self.collector),
            "guard belongs to a different map"
        );
    }

    /// Load the published table through `guard`.
    #[inline]
    fn load_table<'g>(&'g self, guard: &'g MapGuard<'g>) -> &'g Table<K, V> {
        self.check_guard(guard);
        let ptr: *mut Table<K, V> = guard.inner.protect(&self.table, READ_ORD);

        // SAFETY: the table pointer is never null and the guard keeps the
        // table alive even if it is retired while we read it.
        unsafe { &*ptr }
    }

    /// Lock every segment in index order.
    ///
    /// Index order is the only multi-segment acquisition order in the crate,
    /// which keeps concurrent growth, clear and snapshot reads deadlock-free.
    fn lock_all(&self) -> Vec<MutexGuard<'_, usize>> {
        self.segments.iter().map(Mutex::lock).collect()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Look up `key` without locking, borrowing the value for the guard's lifetime.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was created by a different map.
    pub fn get_with_guard<'g, Q>(&'g self, key: &Q, guard: &'g MapGuard<'g>) -> Option<&'g V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash: u64 = self.hasher.hash_one(key);
        let table: &'g Table<K, V> = self.load_table(guard);

        let mut cur: *mut Node<K, V> = guard
            .inner
            .protect(table.head(table.bucket_index(hash)), READ_ORD);
        while !cur.is_null() {
            // SAFETY: loaded through the guard from a protected table.
            let node: &'g Node<K, V> = unsafe { &*cur };
            if node.hash == hash && node.key.borrow() == key {
                return Some(&node.value);
            }
            cur = guard.inner.protect(&node.next, READ_ORD);
        }

        None
    }

    /// Look up `key` without locking and clone its value.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let guard = self.guard();
        self.get_with_guard(key, &guard).cloned()
    }

    /// Check whether `key` is present, without locking.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = self.guard();
        self.get_with_guard(key, &guard).is_some()
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Insert `key` only if it is absent.
    ///
    /// Returns `true` if the entry was added. If the key already exists the
    /// map is left unchanged and `value` is dropped.
    pub fn try_insert(&self, key: K, value: V) -> bool {
        let guard = self.guard();
        self.try_insert_with_guard(key, value, &guard)
    }

    /// [`try_insert`](Self::try_insert) reusing an existing guard.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was created by a different map.
    pub fn try_insert_with_guard(&self, key: K, value: V, guard: &MapGuard<'_>) -> bool {
        self.insert_generic(key, value, false, guard)
    }

    /// Insert or replace.
    ///
    /// Returns `true` if `key` was new, `false` if an existing value was
    /// replaced. Readers holding the old entry keep seeing it until their
    /// guard drops.
    pub fn insert(&self, key: K, value: V) -> bool {
        let guard = self.guard();
        self.insert_with_guard(key, value, &guard)
    }

    /// [`insert`](Self::insert) reusing an existing guard.
    ///
    /// # Panics
    ///
    /// Panics if `guard` was created by a different map.
    pub fn insert_with_guard(&self, key: K, value: V, guard: &MapGuard<'_>) -> bool {
        self.insert_generic(key, value, true, guard)
    }

    /// Shared insert path. Returns `true` if a new entry was linked.
    fn insert_generic(&self, key: K, value: V, replace: bool, guard: &MapGuard<'_>) -> bool {
        self.check_guard(guard);
        let hash: u64 = self.hasher.hash_one(&key);

        loop {
            let table_ptr: *mut Table<K, V> = guard.inner.protect(&self.table, READ_ORD);

            // SAFETY: the table pointer is never null and the guard keeps it alive.
            let table: &Table<K, V> = unsafe { &*table_ptr };
            let bucket: usize = table.bucket_index(hash);
            let mut count = self.segments[bucket & self.segment_mask].lock();

            // Growth or clear published a new table while we waited for the lock.
            // Both store under every segment lock, so holding ours makes the
            // relaxed load exact.
            if !StdPtr::eq(self.table.load(RELAXED), table_ptr) {
                continue;
            }

            let head: &AtomicPtr<Node<K, V>> = table.head(bucket);
            let mut link: &AtomicPtr<Node<K, V>> = head;
            let mut cur: *mut Node<K, V> = head.load(RELAXED);

            while !cur.is_null() {
                // SAFETY: the segment lock is held, so nothing in this chain can
                // be unlinked or retired under us.
                let node: &Node<K, V> = unsafe { &*cur };

                if node.hash == hash && node.key == key {
                    if !replace {
                        return false;
                    }

                    let next: *mut Node<K, V> = node.next.load(RELAXED);
                    link.store(Node::alloc(hash, key, value, next), WRITE_ORD);
                    drop(count);

                    // SAFETY: `cur` is unlinked; readers that already reached it
                    // are protected by their guards.
                    unsafe {
                        guard.inner.defer_retire(cur, |ptr, _| {
                            drop(Box::from_raw(ptr));
                        });
                    }
                    return false;
                }

                link = &node.next;
                cur = node.next.load(RELAXED);
            }

            head.store(Node::alloc(hash, key, value, head.load(RELAXED)), WRITE_ORD);
            *count += 1;

            let over_budget: bool = *count > table.segment_budget(self.segments.len());
            drop(count);

            if over_budget {
                self.grow(table_ptr, guard);
            }
            return true;
        }
    }

    /// Double the bucket count of the table at `observed`.
    ///
    /// No-op if another thread already replaced `observed`.
    #[cold]
    fn grow(&self, observed: *mut Table<K, V>, guard: &MapGuard<'_>) {
        let mut counts = self.lock_all();

        let old_ptr: *mut Table<K, V> = self.table.load(RELAXED);
        if !StdPtr::eq(old_ptr, observed) {
            return;
        }

        // SAFETY: every segment lock is held; the table cannot change or be retired.
        let old: &Table<K, V> = unsafe { &*old_ptr };
        let new_ptr: *mut Table<K, V> = Table::alloc(old.len() * 2);
        // SAFETY: freshly allocated and not yet published.
        let new: &Table<K, V> = unsafe { &*new_ptr };

        for count in &mut counts {
            **count = 0;
        }

        for index in 0..old.len() {
            let mut cur: *mut Node<K, V> = old.head(index).load(RELAXED);
            while !cur.is_null() {
                // SAFETY: nodes reachable from the locked table are live.
                let node: &Node<K, V> = unsafe { &*cur };
                let bucket: usize = new.bucket_index(node.hash);
                let head: &AtomicPtr<Node<K, V>> = new.head(bucket);

                // Relaxed is enough: the table store below publishes everything.
                head.store(
                    Node::alloc(
                        node.hash,
                        node.key.clone(),
                        node.value.clone(),
                        head.load(RELAXED),
                    ),
                    RELAXED,
                );
                *counts[bucket & self.segment_mask] += 1;
                cur = node.next.load(RELAXED);
            }
        }

        self.table.store(new_ptr, WRITE_ORD);
        drop(counts);

        debug_log!(
            from = old.len(),
            to = new.len(),
            segments = self.segments.len(),
            "table grown"
        );

        // SAFETY: `old_ptr` is unpublished; guards that loaded it keep it alive.
        unsafe {
            guard.inner.defer_retire(old_ptr, |ptr, _| {
                drop(Box::from_raw(ptr));
            });
        }
        // A superseded table holds a clone of every entry. Hand it to the
        // collector now instead of waiting for a full batch.
        guard.inner.flush();
    }
}

impl<K, V, S> Drop for ConcurrentMap<K, V, S> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` rules out live guards, and the published table is
        // owned by the map. Retired tables are freed by the collector's drop.
        unsafe {
            drop(Box::from_raw(self.table.load(RELAXED)));
        }
    }
}

impl<K, V, S> fmt::Debug for ConcurrentMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("segments", &self.segments.len())
            .field("buckets", &self.bucket_count())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
