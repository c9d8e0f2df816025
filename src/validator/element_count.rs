//! Owned-count sums vs global counts.
//!
//! For each element kind, sum the live owned elements across all patches
//! and compare against the global count in the context. A mismatch means
//! per-patch ownership and the global bookkeeping have diverged.

use crate::context::MeshContext;
use crate::kernel::KernelPool;
use crate::patch::ElementKind;

pub(super) fn run(ctx: &MeshContext, pool: &KernelPool) -> u64 {
    let mut violations = 0u64;
    for kind in ElementKind::ALL {
        let owned_total =
            pool.sum_over_patches(ctx, |patch| patch.element_set(kind).live_owned_count() as u64);
        let expected = ctx.num_elements(kind) as u64;
        if owned_total != expected {
            log::error!(
                "[Validator] {:?} ownership diverged: {} owned across patches, {} globally",
                kind,
                owned_total,
                expected
            );
            violations += 1;
        }
    }
    violations
}
