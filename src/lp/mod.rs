//! Local-to-owner indirection: the LP table and the patch stash.
//!
//! A patch never embeds another patch's data. A not-owned (ribbon)
//! element carries only a packed pair, local index inside the owner
//! plus a compact stash slot, resolved through one extra indirection
//! against the per-patch stash of neighbor ids.

mod pair;
mod stash;
mod table;

pub use pair::LpPair;
pub use stash::PatchStash;
pub use table::LpHashTable;
