//! Kernel launches: one task-block per patch.
//!
//! Blocks run independently with no ordering guarantee and no
//! cross-block synchronization inside a launch; anything shared across
//! blocks must be atomic. Launches issued back to back are ordered only
//! by program order.

use crate::context::MeshContext;
use crate::error::{MeshError, MeshResult};
use crate::patch::PatchInfo;
use rayon::prelude::*;

/// Launch parameters for patch-parallel kernels.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub worker_threads: usize,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self { worker_threads: num_cpus::get() }
    }
}

/// Thread pool that runs patch-parallel kernels.
pub struct KernelPool {
    pool: rayon::ThreadPool,
}

impl KernelPool {
    pub fn new(config: &LaunchConfig) -> MeshResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build()
            .map_err(|e| MeshError::LaunchFailed { message: e.to_string() })?;
        Ok(Self { pool })
    }

    /// Run `kernel` once per patch, blocks in parallel.
    pub fn for_each_patch<F>(&self, ctx: &MeshContext, kernel: F)
    where
        F: Fn(&PatchInfo) + Sync,
    {
        self.pool.install(|| {
            ctx.patches().par_iter().for_each(|patch| kernel(patch));
        });
    }

    /// Run `kernel` once per patch and sum the per-block results.
    pub fn sum_over_patches<F>(&self, ctx: &MeshContext, kernel: F) -> u64
    where
        F: Fn(&PatchInfo) -> u64 + Sync,
    {
        self.pool.install(|| ctx.patches().par_iter().map(|patch| kernel(patch)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchInfo;

    #[test]
    fn every_patch_runs_exactly_once() {
        let patches: Vec<PatchInfo> = (0..32).map(|id| PatchInfo::new(id, 4, 4, 4)).collect();
        let ctx = MeshContext::new(patches, 0, 0, 0);
        let pool = KernelPool::new(&LaunchConfig { worker_threads: 4 }).unwrap();
        let total = pool.sum_over_patches(&ctx, |patch| patch.patch_id() as u64);
        assert_eq!(total, (0..32u64).sum::<u64>());
    }
}
