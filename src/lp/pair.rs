//! Packed local-to-owner pair.

use crate::constants::{LP_KEY_BITS, LP_LOCAL_BITS, LP_STASH_BITS};
use bytemuck::{Pod, Zeroable};

const KEY_SHIFT: u32 = 0;
const LOCAL_SHIFT: u32 = LP_KEY_BITS;
const STASH_SHIFT: u32 = LP_KEY_BITS + LP_LOCAL_BITS;

const KEY_MASK: u32 = (1 << LP_KEY_BITS) - 1;
const LOCAL_MASK: u32 = (1 << LP_LOCAL_BITS) - 1;
const STASH_MASK: u32 = (1 << LP_STASH_BITS) - 1;

/// One LP table entry: the not-owned local index (key), the local index
/// inside the owner patch, and the owner patch's slot in the patch
/// stash, packed into one word.
///
/// The all-ones word is the invalid/empty sentinel. Valid pairs always
/// leave the bits above the three fields zero, so a valid pair can never
/// compare equal to [`LpPair::INVALID`].
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct LpPair(u32);

impl LpPair {
    /// Empty table slot / failed lookup.
    pub const INVALID: LpPair = LpPair(u32::MAX);

    /// Pack a pair. The fields must fit their bit widths.
    pub fn new(key: u16, owner_local: u16, stash_slot: u8) -> Self {
        assert!((key as u32) <= KEY_MASK, "LP key {} exceeds {} bits", key, LP_KEY_BITS);
        assert!(
            (owner_local as u32) <= LOCAL_MASK,
            "owner local index {} exceeds {} bits",
            owner_local,
            LP_LOCAL_BITS
        );
        assert!(
            (stash_slot as u32) <= STASH_MASK,
            "stash slot {} exceeds {} bits",
            stash_slot,
            LP_STASH_BITS
        );
        Self(
            ((key as u32) << KEY_SHIFT)
                | ((owner_local as u32) << LOCAL_SHIFT)
                | ((stash_slot as u32) << STASH_SHIFT),
        )
    }

    /// The not-owned local index this entry is keyed on.
    #[inline]
    pub fn key(self) -> u16 {
        ((self.0 >> KEY_SHIFT) & KEY_MASK) as u16
    }

    /// Local index of the element inside its owner patch.
    #[inline]
    pub fn owner_local(self) -> u16 {
        ((self.0 >> LOCAL_SHIFT) & LOCAL_MASK) as u16
    }

    /// Slot of the owner patch id in the patch stash.
    #[inline]
    pub fn stash_slot(self) -> u8 {
        ((self.0 >> STASH_SHIFT) & STASH_MASK) as u8
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl std::fmt::Debug for LpPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "LpPair(key={}, owner_local={}, stash_slot={})",
                self.key(),
                self.owner_local(),
                self.stash_slot()
            )
        } else {
            write!(f, "LpPair(INVALID)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let pair = LpPair::new(4095, 17, 31);
        assert_eq!(pair.key(), 4095);
        assert_eq!(pair.owner_local(), 17);
        assert_eq!(pair.stash_slot(), 31);
        assert!(pair.is_valid());
    }

    #[test]
    fn max_fields_do_not_collide_with_invalid() {
        let pair = LpPair::new(4095, 4095, 31);
        assert!(pair.is_valid());
        assert_ne!(pair, LpPair::INVALID);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn oversized_owner_local_asserts() {
        let _ = LpPair::new(0, 1 << 12, 0);
    }
}
