//! Cache of stripe tables for points that are multiplied repeatedly.
//!
//! The cache has [`CACHE_ENTRIES`] slots keyed by the affine coordinates of a
//! point. A point's table is built the second time the point is looked up;
//! the first lookup only claims a slot. When every slot is taken, the slot
//! with the lowest use count is evicted.
//!
//! Tables are built outside the lock and shared through [`Arc`], so
//! concurrent lookups of a new point may build the same table twice but
//! never observe a partial one.

use super::{AffinePoint, ProjectivePoint, StripeTable};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

/// Number of slots in a [`PointCache`].
pub const CACHE_ENTRIES: usize = 16;

/// Affine `x ‖ y`, big-endian.
type Key = [u8; 64];

#[derive(Default)]
struct Slot {
    key: Option<Key>,
    count: u32,
    table: Option<Arc<StripeTable>>,
}

#[derive(Default)]
struct Slots {
    entries: [Slot; CACHE_ENTRIES],
    /// Most recently claimed slot.
    last: usize,
}

impl Slots {
    fn find(&self, key: &Key) -> Option<usize> {
        self.entries
            .iter()
            .position(|slot| slot.key.as_ref() == Some(key))
    }

    /// First free slot after the most recent one, else the least used.
    fn victim(&self) -> usize {
        (1..=CACHE_ENTRIES)
            .map(|i| (self.last + i) % CACHE_ENTRIES)
            .find(|&i| self.entries[i].key.is_none())
            .unwrap_or_else(|| {
                self.entries
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, slot)| slot.count)
                    .map_or(0, |(i, _)| i)
            })
    }
}

/// Mutex-guarded cache of per-point stripe tables.
///
/// [`PointCache::global`] is the process-wide instance; independent caches
/// can be created with [`PointCache::new`].
pub struct PointCache {
    slots: Mutex<Slots>,
}

impl PointCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
        }
    }

    /// The process-wide cache.
    pub fn global() -> &'static Self {
        static GLOBAL: LazyLock<PointCache> = LazyLock::new(PointCache::new);
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // slot updates are single assignments, so a panicking holder cannot
        // leave the state inconsistent
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a use of `point` and return its stripe table once it has one.
    ///
    /// Returns `None` for the identity and on the first use of a point.
    pub fn lookup(&self, point: &AffinePoint) -> Option<Arc<StripeTable>> {
        if bool::from(point.is_identity()) {
            return None;
        }
        let key = key(point);

        let index = {
            let mut slots = self.lock();
            match slots.find(&key) {
                Some(index) => {
                    let slot = &mut slots.entries[index];
                    slot.count = slot.count.saturating_add(1);
                    if let Some(table) = &slot.table {
                        return Some(Arc::clone(table));
                    }
                    index
                }
                None => {
                    let index = slots.victim();
                    if slots.entries[index].key.is_some() {
                        log::debug!(
                            "point cache: evicting slot {} (count {})",
                            index,
                            slots.entries[index].count
                        );
                    }
                    slots.entries[index] = Slot {
                        key: Some(key),
                        count: 1,
                        table: None,
                    };
                    slots.last = index;
                    log::trace!("point cache: claimed slot {}", index);
                    return None;
                }
            }
        };

        log::debug!("point cache: building stripe table for slot {}", index);
        let table = Arc::new(StripeTable::new(&ProjectivePoint::from(point)));

        let mut slots = self.lock();
        let slot = &mut slots.entries[index];
        if slot.key.as_ref() == Some(&key) {
            match &slot.table {
                Some(existing) => return Some(Arc::clone(existing)),
                None => slot.table = Some(Arc::clone(&table)),
            }
        }
        Some(table)
    }

    /// Use count of `point`, if it holds a slot.
    pub fn use_count(&self, point: &AffinePoint) -> Option<u32> {
        let slots = self.lock();
        slots.find(&key(point)).map(|i| slots.entries[i].count)
    }

    /// Does `point` hold a slot with a built table?
    pub fn has_table(&self, point: &AffinePoint) -> bool {
        let slots = self.lock();
        slots
            .find(&key(point))
            .is_some_and(|i| slots.entries[i].table.is_some())
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|slot| slot.key.is_some())
            .count()
    }

    /// Are all slots free?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free every slot.
    pub fn clear(&self) {
        *self.lock() = Slots::default();
    }
}

impl Default for PointCache {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PointCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn key(point: &AffinePoint) -> Key {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(&point.x());
    key[32..].copy_from_slice(&point.y());
    key
}

#[cfg(test)]
mod tests {
    use super::{CACHE_ENTRIES, PointCache};
    use crate::{AffinePoint, ProjectivePoint, Scalar, U256};
    use std::sync::Arc;

    fn point(k: u64) -> AffinePoint {
        (ProjectivePoint::GENERATOR * Scalar::from_u64(k)).to_affine()
    }

    #[test]
    fn table_built_on_second_use() {
        let cache = PointCache::new();
        let p = point(7);
        assert!(cache.lookup(&p).is_none());
        assert_eq!(cache.use_count(&p), Some(1));
        assert!(!cache.has_table(&p));

        let table = cache.lookup(&p).unwrap();
        assert!(cache.has_table(&p));
        assert_eq!(table.base(), p);

        let again = cache.lookup(&p).unwrap();
        assert!(Arc::ptr_eq(&table, &again));
        assert_eq!(cache.use_count(&p), Some(3));
    }

    #[test]
    fn identity_is_never_cached() {
        let cache = PointCache::new();
        assert!(cache.lookup(&AffinePoint::IDENTITY).is_none());
        assert!(cache.lookup(&AffinePoint::IDENTITY).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_used() {
        let cache = PointCache::new();
        for k in 1..=CACHE_ENTRIES as u64 {
            cache.lookup(&point(k));
            if k != 5 {
                cache.lookup(&point(k));
            }
        }
        assert_eq!(cache.len(), CACHE_ENTRIES);

        let newcomer = point(100);
        cache.lookup(&newcomer);
        assert_eq!(cache.len(), CACHE_ENTRIES);
        assert_eq!(cache.use_count(&point(5)), None);
        assert_eq!(cache.use_count(&newcomer), Some(1));
        assert!(cache.has_table(&point(6)));
    }

    #[test]
    fn clear_frees_slots() {
        let cache = PointCache::new();
        cache.lookup(&point(2));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_between_threads() {
        let cache = Arc::new(PointCache::new());
        let p = point(11);
        let k = U256::from_u64(0xdead_beef);
        let expected = ProjectivePoint::from(&p) * Scalar::from_u64(0xdead_beef);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.lookup(&p);
                    cache.lookup(&p).map(|table| table.mul(&k))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(expected));
        }
        assert!(cache.has_table(&p));
        assert_eq!(cache.len(), 1);
    }
}
