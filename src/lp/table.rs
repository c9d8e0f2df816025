//! Open-addressed local-to-owner lookup table.
//!
//! Fixed capacity, bounded position-dependent probing, and a small
//! overflow stash for entries that fail to place. Lookups are total for
//! live not-owned keys: a miss is either a caller usage error (probing
//! an owned index) or a sign the table must grow.

use super::LpPair;
use crate::constants::{LP_OVERFLOW_SLOTS, LP_PROBE_LIMIT};
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Per-patch hash table mapping a not-owned local index to its
/// [`LpPair`].
#[derive(Clone)]
pub struct LpHashTable {
    table: Vec<LpPair>,
    stash: [LpPair; LP_OVERFLOW_SLOTS],
}

impl LpHashTable {
    /// A table able to hold at least `capacity` entries. Capacity is
    /// rounded up to a power of two for mask-based probing.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(LP_OVERFLOW_SLOTS).next_power_of_two();
        Self {
            table: vec![LpPair::INVALID; capacity],
            stash: [LpPair::INVALID; LP_OVERFLOW_SLOTS],
        }
    }

    /// Main table capacity (excludes the overflow stash).
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    #[inline]
    fn probe_slot(&self, key: u16, attempt: u32) -> usize {
        let mut hasher = FxHasher::default();
        hasher.write_u16(key);
        hasher.write_u32(attempt);
        (hasher.finish() as usize) & (self.table.len() - 1)
    }

    /// Insert an entry, replacing any existing entry with the same key.
    /// Returns false when both the probe sequence and the overflow stash
    /// are exhausted; the caller must treat that as a growth trigger,
    /// never drop the entry.
    pub fn insert(&mut self, pair: LpPair) -> bool {
        assert!(pair.is_valid(), "inserting the invalid pair");
        let key = pair.key();
        for attempt in 0..LP_PROBE_LIMIT {
            let slot = self.probe_slot(key, attempt);
            let entry = self.table[slot];
            if !entry.is_valid() || entry.key() == key {
                self.table[slot] = pair;
                return true;
            }
        }
        for entry in &mut self.stash {
            if !entry.is_valid() || entry.key() == key {
                *entry = pair;
                return true;
            }
        }
        false
    }

    /// Look up the entry for `key`. Returns [`LpPair::INVALID`] on a
    /// miss, which for a live not-owned key indicates a caller bug.
    pub fn find(&self, key: u16) -> LpPair {
        for attempt in 0..LP_PROBE_LIMIT {
            let slot = self.probe_slot(key, attempt);
            let entry = self.table[slot];
            if entry.is_valid() && entry.key() == key {
                return entry;
            }
        }
        for entry in &self.stash {
            if entry.is_valid() && entry.key() == key {
                return *entry;
            }
        }
        LpPair::INVALID
    }

    /// Number of live entries, table plus stash.
    pub fn len(&self) -> usize {
        self.table.iter().chain(self.stash.iter()).filter(|e| e.is_valid()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow to at least double the current capacity and rehash. Every
    /// existing mapping is preserved; doubling repeats until all entries
    /// place.
    pub fn grow(&mut self) {
        let entries: Vec<LpPair> = self
            .table
            .iter()
            .chain(self.stash.iter())
            .copied()
            .filter(|e| e.is_valid())
            .collect();
        let mut capacity = self.table.len() * 2;
        'retry: loop {
            let mut grown = LpHashTable::new(capacity);
            for &entry in &entries {
                if !grown.insert(entry) {
                    capacity *= 2;
                    continue 'retry;
                }
            }
            *self = grown;
            return;
        }
    }

    /// Raw main table, for bulk host/device transfer only.
    pub fn raw_table(&self) -> &[LpPair] {
        &self.table
    }

    /// Raw overflow stash, for bulk host/device transfer only.
    pub fn raw_stash(&self) -> &[LpPair] {
        &self.stash
    }

    /// Raw main table as bytes.
    pub fn table_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.table)
    }

    /// Overwrite from raw host-mirror storage.
    pub fn copy_from_raw(&mut self, table: &[LpPair], stash: &[LpPair]) {
        assert_eq!(table.len(), self.table.len(), "LP table size mismatch");
        assert_eq!(stash.len(), self.stash.len(), "LP stash size mismatch");
        self.table.copy_from_slice(table);
        self.stash.copy_from_slice(stash);
    }
}

impl std::fmt::Debug for LpHashTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LpHashTable(capacity={}, len={})", self.capacity(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    #[test]
    fn find_returns_exact_inserted_pair() {
        let mut table = LpHashTable::new(64);
        for key in 0..48u16 {
            assert!(table.insert(LpPair::new(key, key * 3 % 97, (key % 32) as u8)));
        }
        for key in 0..48u16 {
            let pair = table.find(key);
            assert!(pair.is_valid());
            assert_eq!(pair.key(), key);
            assert_eq!(pair.owner_local(), key * 3 % 97);
            assert_eq!(pair.stash_slot(), (key % 32) as u8);
        }
    }

    #[test]
    fn missing_key_reports_invalid() {
        let mut table = LpHashTable::new(16);
        table.insert(LpPair::new(3, 9, 1));
        assert!(!table.find(4).is_valid());
    }

    #[test]
    fn reinsert_same_key_replaces() {
        let mut table = LpHashTable::new(16);
        assert!(table.insert(LpPair::new(5, 10, 0)));
        assert!(table.insert(LpPair::new(5, 11, 2)));
        let pair = table.find(5);
        assert_eq!(pair.owner_local(), 11);
        assert_eq!(pair.stash_slot(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn growth_preserves_every_mapping() {
        let mut table = LpHashTable::new(8);
        let mut keys: Vec<u16> = (0..200).collect();
        keys.shuffle(&mut rand::thread_rng());
        let mut inserted = Vec::new();
        for &key in &keys {
            let pair = LpPair::new(key, key.wrapping_mul(7) % 4096, (key % 17) as u8);
            if !table.insert(pair) {
                table.grow();
                assert!(table.insert(pair), "insert after grow must succeed");
            }
            inserted.push(pair);
        }
        table.grow();
        for pair in inserted {
            assert_eq!(table.find(pair.key()), pair);
        }
    }

    #[test]
    fn overflow_lands_in_stash_before_failing() {
        // A tiny table saturates the probe sequence quickly; entries must
        // keep landing in the stash until it too is full.
        let mut table = LpHashTable::new(1);
        let mut failed = false;
        for key in 0..64u16 {
            if !table.insert(LpPair::new(key, key, 0)) {
                failed = true;
                break;
            }
        }
        assert!(failed, "a full table must report insertion failure");
        // Everything inserted before the failure is still findable.
        for key in 0..table.len() as u16 {
            assert!(table.find(key).is_valid());
        }
    }
}
