//! The generic indexed element set.
//!
//! Vertices, edges, and faces all carry the same bookkeeping trio:
//! active mask, owned mask, and LP table. One component, instantiated
//! three times per patch, so the invariants are written once.

use crate::bitmask::Bitmask;
use crate::constants::MAX_ELEMENTS_PER_PATCH;
use crate::error::{MeshError, MeshResult};
use crate::lp::{LpHashTable, LpPair};
use crate::patch::ElementKind;

/// Count, capacity, masks, and LP table for one element kind of one
/// patch.
#[derive(Clone)]
pub struct ElementSet {
    kind: ElementKind,
    patch_id: u32,
    num: u16,
    capacity: u16,
    active: Bitmask,
    owned: Bitmask,
    lp: LpHashTable,
}

impl ElementSet {
    pub fn new(kind: ElementKind, patch_id: u32, capacity: u16) -> Self {
        assert!(
            capacity <= MAX_ELEMENTS_PER_PATCH,
            "{:?} capacity {} exceeds the LP key width",
            kind,
            capacity
        );
        Self {
            kind,
            patch_id,
            num: 0,
            capacity,
            active: Bitmask::new(capacity as usize),
            owned: Bitmask::new(capacity as usize),
            lp: LpHashTable::new((capacity as usize / 2).max(8)),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Current element count (live and tombstoned slots combined).
    pub fn num(&self) -> u16 {
        self.num
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    /// Append one element slot, active, owned as requested.
    pub fn push(&mut self, owned: bool) -> MeshResult<u16> {
        if self.num == self.capacity {
            return Err(MeshError::CapacityExceeded {
                kind: self.kind,
                patch: self.patch_id,
                capacity: self.capacity,
            });
        }
        let local = self.num;
        self.num += 1;
        self.active.set(local as usize, false);
        if owned {
            self.owned.set(local as usize, false);
        }
        Ok(local)
    }

    #[inline]
    pub fn is_active(&self, local: u16) -> bool {
        self.active.test(local as usize)
    }

    #[inline]
    pub fn is_owned(&self, local: u16) -> bool {
        self.owned.test(local as usize)
    }

    /// Tombstone one element. Traversals and checks skip it from here on.
    pub fn delete(&mut self, local: u16) {
        assert!(local < self.num, "deleting {:?} {} beyond count {}", self.kind, local, self.num);
        self.active.reset(local as usize, false);
    }

    /// Flip the owned bit, used when ownership migrates between patches.
    pub fn set_owned(&mut self, local: u16, owned: bool) {
        assert!(local < self.num, "{:?} {} beyond count {}", self.kind, local, self.num);
        if owned {
            self.owned.set(local as usize, false);
        } else {
            self.owned.reset(local as usize, false);
        }
    }

    /// Elements that are both owned and not tombstoned. This is the
    /// count the global totals are reconciled against.
    pub fn live_owned_count(&self) -> u32 {
        let mut count = 0u32;
        let full_words = self.num as usize / 32;
        for word in 0..full_words {
            count += (self.active.word(word) & self.owned.word(word)).count_ones();
        }
        let tail = self.num as usize % 32;
        if tail != 0 {
            let mask = (1u32 << tail) - 1;
            count += (self.active.word(full_words) & self.owned.word(full_words) & mask).count_ones();
        }
        count
    }

    /// Insert an LP entry. Failure means both the probe sequence and the
    /// overflow stash are exhausted; the caller grows and retries.
    pub fn try_insert_lp(&mut self, pair: LpPair) -> MeshResult<()> {
        if self.lp.insert(pair) {
            Ok(())
        } else {
            Err(MeshError::LpTableFull { kind: self.kind, patch: self.patch_id })
        }
    }

    /// Look up the owner pair for a not-owned local index. Calling this
    /// on an owned index is a usage error.
    pub fn find_lp(&self, local: u16) -> LpPair {
        debug_assert!(
            !self.is_owned(local),
            "LP lookup on owned {:?} {} in patch {}",
            self.kind,
            local,
            self.patch_id
        );
        self.lp.find(local)
    }

    /// Grow capacity, preserving every mask bit and LP mapping.
    /// Capacities never shrink.
    pub fn grow(&mut self, new_capacity: u16) {
        assert!(new_capacity >= self.capacity, "element capacity never shrinks");
        assert!(
            new_capacity <= MAX_ELEMENTS_PER_PATCH,
            "{:?} capacity {} exceeds the LP key width",
            self.kind,
            new_capacity
        );
        self.active = self.active.resized(new_capacity as usize);
        self.owned = self.owned.resized(new_capacity as usize);
        self.capacity = new_capacity;
    }

    pub fn lp(&self) -> &LpHashTable {
        &self.lp
    }

    pub fn lp_mut(&mut self) -> &mut LpHashTable {
        &mut self.lp
    }

    pub fn active_mask(&self) -> &Bitmask {
        &self.active
    }

    pub fn owned_mask(&self) -> &Bitmask {
        &self.owned
    }

    pub fn active_mask_mut(&mut self) -> &mut Bitmask {
        &mut self.active
    }

    pub fn owned_mask_mut(&mut self) -> &mut Bitmask {
        &mut self.owned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_sets_active_and_owned_bits() {
        let mut set = ElementSet::new(ElementKind::Vertex, 0, 8);
        let a = set.push(true).unwrap();
        let b = set.push(false).unwrap();
        assert!(set.is_active(a) && set.is_owned(a));
        assert!(set.is_active(b) && !set.is_owned(b));
        assert_eq!(set.num(), 2);
        assert_eq!(set.live_owned_count(), 1);
    }

    #[test]
    fn delete_tombstones_and_drops_live_count() {
        let mut set = ElementSet::new(ElementKind::Face, 3, 4);
        let a = set.push(true).unwrap();
        set.push(true).unwrap();
        set.delete(a);
        assert!(!set.is_active(a));
        assert!(set.is_owned(a), "tombstoning leaves the owned bit alone");
        assert_eq!(set.live_owned_count(), 1);
    }

    #[test]
    fn capacity_exhaustion_is_an_error() {
        let mut set = ElementSet::new(ElementKind::Edge, 1, 2);
        set.push(true).unwrap();
        set.push(true).unwrap();
        match set.push(true) {
            Err(MeshError::CapacityExceeded { kind: ElementKind::Edge, patch: 1, capacity: 2 }) => {}
            other => panic!("expected CapacityExceeded, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn grow_preserves_masks_and_lp() {
        let mut set = ElementSet::new(ElementKind::Vertex, 0, 40);
        for i in 0..40 {
            set.push(i % 2 == 0).unwrap();
        }
        set.try_insert_lp(LpPair::new(1, 5, 0)).unwrap();
        set.grow(100);
        assert_eq!(set.capacity(), 100);
        for i in 0..40u16 {
            assert!(set.is_active(i));
            assert_eq!(set.is_owned(i), i % 2 == 0);
        }
        assert_eq!(set.find_lp(1).owner_local(), 5);
    }
}
