//! Cross-patch consistency validation.
//!
//! Four independent checks, each a patch-parallel kernel with its own
//! zeroed error counter. Validation is read-only, requires a quiescent
//! mesh (no concurrent mutation), and always runs every check to
//! completion: each failure is reported under its own label and the
//! overall result is the AND of the four.

mod element_count;
mod mirroring;
mod ribbon;
mod uniqueness;

use crate::context::MeshContext;
use crate::error::MeshResult;
use crate::kernel::{KernelPool, LaunchConfig};

/// Runs the consistency checks over one mesh context.
pub struct Validator<'a> {
    ctx: &'a MeshContext,
    pool: KernelPool,
}

impl<'a> Validator<'a> {
    pub fn new(ctx: &'a MeshContext) -> MeshResult<Self> {
        Self::with_config(ctx, &LaunchConfig::default())
    }

    pub fn with_config(ctx: &'a MeshContext, config: &LaunchConfig) -> MeshResult<Self> {
        Ok(Self { ctx, pool: KernelPool::new(config)? })
    }

    /// Run all four checks. One error line per failing check; the
    /// ambient log level is raised for the duration if it would swallow
    /// the diagnostics, and restored on exit.
    pub fn validate(&self) -> bool {
        let previous_level = log::max_level();
        if previous_level < log::LevelFilter::Info {
            log::set_max_level(log::LevelFilter::Info);
        }
        let passed = self.run_all();
        log::set_max_level(previous_level);
        passed
    }

    fn run_all(&self) -> bool {
        let results = [
            ("check_element_counts", element_count::run(self.ctx, &self.pool)),
            ("check_uniqueness", uniqueness::run(self.ctx, &self.pool)),
            ("check_not_owned", mirroring::run(self.ctx, &self.pool)),
            ("check_ribbon", ribbon::run(self.ctx, &self.pool)),
        ];
        let mut passed = true;
        for (label, violations) in results {
            if violations == 0 {
                log::info!("[Validator] {} passed", label);
            } else {
                log::error!("[Validator] {} failed: {} violations", label, violations);
                passed = false;
            }
        }
        passed
    }

    /// Owned-count sums per kind vs the global counts.
    pub fn check_element_counts(&self) -> bool {
        element_count::run(self.ctx, &self.pool) == 0
    }

    /// Edge endpoint and face corner distinctness.
    pub fn check_uniqueness(&self) -> bool {
        uniqueness::run(self.ctx, &self.pool) == 0
    }

    /// Ribbon copies mirror their owner's incidence exactly.
    pub fn check_not_owned(&self) -> bool {
        mirroring::run(self.ctx, &self.pool) == 0
    }

    /// Owned edges see an owned face; patch-local vertex-face adjacency
    /// covers the global one.
    pub fn check_ribbon(&self) -> bool {
        ribbon::run(self.ctx, &self.pool) == 0
    }
}
