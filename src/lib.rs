//! Patch-based parallel representation for polygonal surface meshes.
//!
//! The mesh is partitioned into many independently addressable patches,
//! each carrying a local copy of its topology plus the bookkeeping that
//! lets per-patch parallel kernels answer neighborhood queries without
//! global synchronization: ownership and active bitmasks, ribbon (ghost)
//! copies of boundary elements, and a local-to-owner lookup table
//! resolved through a compact stash of neighbor patch ids.
//!
//! The crate supplies the data model shared by query and edit kernels
//! ([`PatchInfo`], [`MeshContext`]), the consistency checks that guard
//! it ([`Validator`]), and the host reconciliation that keeps host and
//! device views in step after topology changes ([`update_host`]).

pub mod attributes;
pub mod bitmask;
pub mod constants;
pub mod context;
pub mod error;
pub mod host;
pub mod kernel;
pub mod lp;
pub mod patch;
pub mod validator;

pub use attributes::PatchAttribute;
pub use bitmask::Bitmask;
pub use context::{MeshContext, PatchSummaries};
pub use error::{MeshError, MeshResult};
pub use host::{update_host, HostMirror};
pub use kernel::{KernelPool, LaunchConfig};
pub use lp::{LpHashTable, LpPair, PatchStash};
pub use patch::{ElementHandle, ElementKind, ElementSet, PatchInfo};
pub use validator::Validator;
