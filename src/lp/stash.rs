//! Per-patch table of neighbor patch ids.
//!
//! LP entries store a compact stash slot instead of a full 32-bit patch
//! id; this table resolves the slot back to the id.

use crate::constants::{INVALID_PATCH, PATCH_STASH_CAPACITY};

/// Small append-only table of neighboring patch ids.
#[derive(Clone)]
pub struct PatchStash {
    patches: [u32; PATCH_STASH_CAPACITY],
}

impl PatchStash {
    pub fn new() -> Self {
        Self { patches: [INVALID_PATCH; PATCH_STASH_CAPACITY] }
    }

    /// Slot of `patch`, appending it if not present. Returns None when
    /// the stash is full.
    pub fn insert(&mut self, patch: u32) -> Option<u8> {
        assert_ne!(patch, INVALID_PATCH, "inserting the invalid patch id");
        for (slot, entry) in self.patches.iter_mut().enumerate() {
            if *entry == patch {
                return Some(slot as u8);
            }
            if *entry == INVALID_PATCH {
                *entry = patch;
                return Some(slot as u8);
            }
        }
        None
    }

    /// Patch id stored at `slot`.
    #[inline]
    pub fn get_patch(&self, slot: u8) -> u32 {
        assert!((slot as usize) < PATCH_STASH_CAPACITY, "stash slot {} out of range", slot);
        self.patches[slot as usize]
    }

    /// Slot holding `patch`, if any.
    pub fn find(&self, patch: u32) -> Option<u8> {
        self.patches.iter().position(|&p| p == patch).map(|slot| slot as u8)
    }

    /// Raw slot array, for bulk host/device transfer only.
    pub fn raw(&self) -> &[u32; PATCH_STASH_CAPACITY] {
        &self.patches
    }

    /// Overwrite from raw host-mirror storage.
    pub fn copy_from_raw(&mut self, patches: &[u32; PATCH_STASH_CAPACITY]) {
        self.patches = *patches;
    }
}

impl Default for PatchStash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_deduplicates_and_appends() {
        let mut stash = PatchStash::new();
        assert_eq!(stash.insert(7), Some(0));
        assert_eq!(stash.insert(9), Some(1));
        assert_eq!(stash.insert(7), Some(0));
        assert_eq!(stash.get_patch(0), 7);
        assert_eq!(stash.get_patch(1), 9);
        assert_eq!(stash.find(9), Some(1));
        assert_eq!(stash.find(8), None);
    }

    #[test]
    fn full_stash_reports_none() {
        let mut stash = PatchStash::new();
        for patch in 0..PATCH_STASH_CAPACITY as u32 {
            assert!(stash.insert(patch + 1).is_some());
        }
        assert_eq!(stash.insert(999), None);
    }
}
