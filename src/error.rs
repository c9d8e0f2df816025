//! Crate-wide error handling.
//!
//! Device-side kernels never return errors; they report through shared
//! atomic counters inspected after the launch. Everything host-side goes
//! through [`MeshError`]. Contract violations (out-of-bounds bit
//! indices, probing past a full table) are asserts, not errors.

use crate::patch::ElementKind;

/// Result alias used throughout the crate.
pub type MeshResult<T> = Result<T, MeshError>;

/// Host-side mesh structure errors.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// The device reports a different patch count than the host mirror
    /// was built for. Reconciliation does not support patch-count
    /// changes; the call aborts before touching any state.
    #[error("patch count changed between host and device: host {host}, device {device}")]
    PatchCountChanged { host: u32, device: u32 },

    /// The per-patch owned-count prefix sum does not reach the global
    /// element count. Surfaced after the reconciliation pass completes.
    #[error("{kind:?} prefix-sum total {computed} does not match global count {expected}")]
    PrefixSumMismatch {
        kind: ElementKind,
        computed: u32,
        expected: u32,
    },

    /// An LP insertion failed in both the main table and the overflow
    /// stash. The caller is expected to grow the table and retry.
    #[error("LP table full for {kind:?} in patch {patch}")]
    LpTableFull { kind: ElementKind, patch: u32 },

    /// An element append would exceed the patch's current capacity.
    #[error("{kind:?} capacity {capacity} exceeded in patch {patch}")]
    CapacityExceeded {
        kind: ElementKind,
        patch: u32,
        capacity: u16,
    },

    /// The per-patch stash has no free slot for another neighbor patch.
    #[error("patch stash full in patch {patch} while adding neighbor {neighbor}")]
    PatchStashFull { patch: u32, neighbor: u32 },

    /// The kernel thread pool could not be constructed.
    #[error("kernel pool launch failed: {message}")]
    LaunchFailed { message: String },
}
