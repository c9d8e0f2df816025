//! Central constants for the patch data model.
//!
//! The bit widths here bound the packed [`LpPair`](crate::lp::LpPair)
//! encoding: key, owner-local index, and stash slot must together fit in
//! one 32-bit word.

/// Sentinel patch id carried by invalid element handles.
pub const INVALID_PATCH: u32 = u32::MAX;

/// Sentinel local element index.
pub const INVALID_LOCAL: u16 = u16::MAX;

/// Bits for the not-owned local index (the LP table key).
pub const LP_KEY_BITS: u32 = 12;

/// Bits for the local index inside the owner patch.
pub const LP_LOCAL_BITS: u32 = 12;

/// Bits for the owner patch's slot in the patch stash.
pub const LP_STASH_BITS: u32 = 5;

/// Hard cap on elements of one kind in a single patch, implied by the
/// LP key width.
pub const MAX_ELEMENTS_PER_PATCH: u16 = 1 << LP_KEY_BITS;

/// Neighbor patch ids a single patch can reference.
pub const PATCH_STASH_CAPACITY: usize = 1 << LP_STASH_BITS;

/// Probe attempts before an LP insertion falls through to the overflow
/// stash.
pub const LP_PROBE_LIMIT: u32 = 16;

/// Overflow stash entries per LP table.
pub const LP_OVERFLOW_SLOTS: usize = 8;
