//! Standard memory orderings for map access.
//!
//! These constants keep ordering usage consistent between the locked write
//! path and the lock-free read path, and make the intent clear at each
//! access point.

use std::sync::atomic::Ordering;

/// Ordering for loading the table pointer, bucket heads and `next` links
/// during a lock-free traversal. Pairs with writer's Release stores.
pub const READ_ORD: Ordering = Ordering::Acquire;

/// Ordering for publishing a node or a table while holding segment locks.
/// Pairs with reader's Acquire loads.
pub const WRITE_ORD: Ordering = Ordering::Release;

/// Ordering for loads performed while the owning segment lock is held.
/// The lock already provides synchronization with other writers.
pub const RELAXED: Ordering = Ordering::Relaxed;
