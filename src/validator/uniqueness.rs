//! Edge and face definition uniqueness.
//!
//! A live edge's two endpoints must be distinct and active. A live
//! face's three edges must be distinct and active, and the three corner
//! vertices they induce (direction tags select the endpoints) must be
//! pairwise distinct and active. Tombstoned elements carry no
//! obligation and are skipped.

use crate::context::MeshContext;
use crate::kernel::KernelPool;
use crate::patch::PatchInfo;
use std::sync::atomic::{AtomicU64, Ordering};

pub(super) fn run(ctx: &MeshContext, pool: &KernelPool) -> u64 {
    let errors = AtomicU64::new(0);
    pool.for_each_patch(ctx, |patch| {
        let found = check_edges(patch) + check_faces(patch);
        if found != 0 {
            errors.fetch_add(found, Ordering::Relaxed);
        }
    });
    errors.load(Ordering::Relaxed)
}

fn check_edges(patch: &PatchInfo) -> u64 {
    let mut errors = 0;
    let num_vertices = patch.vertices().num();
    for edge in 0..patch.edges().num() {
        if !patch.edges().is_active(edge) {
            continue;
        }
        let v0 = patch.edge_endpoint(edge, false);
        let v1 = patch.edge_endpoint(edge, true);
        if v0 >= num_vertices || v1 >= num_vertices {
            log::debug!("[Validator] patch {} edge {} endpoint out of range", patch.patch_id(), edge);
            errors += 1;
        } else if v0 == v1 {
            log::debug!("[Validator] patch {} edge {} has equal endpoints", patch.patch_id(), edge);
            errors += 1;
        } else if !patch.vertices().is_active(v0) || !patch.vertices().is_active(v1) {
            log::debug!("[Validator] patch {} edge {} references a deleted vertex", patch.patch_id(), edge);
            errors += 1;
        }
    }
    errors
}

fn check_faces(patch: &PatchInfo) -> u64 {
    let mut errors = 0;
    let num_edges = patch.edges().num();
    let num_vertices = patch.vertices().num();
    for face in 0..patch.faces().num() {
        if !patch.faces().is_active(face) {
            continue;
        }
        let [(e0, d0), (e1, d1), (e2, d2)] = patch.face_edges(face);
        if e0 >= num_edges || e1 >= num_edges || e2 >= num_edges {
            log::debug!("[Validator] patch {} face {} edge index out of range", patch.patch_id(), face);
            errors += 1;
            continue;
        }
        if e0 == e1 || e1 == e2 || e0 == e2 {
            log::debug!("[Validator] patch {} face {} repeats an edge", patch.patch_id(), face);
            errors += 1;
            continue;
        }
        if !patch.edges().is_active(e0) || !patch.edges().is_active(e1) || !patch.edges().is_active(e2) {
            log::debug!("[Validator] patch {} face {} references a deleted edge", patch.patch_id(), face);
            errors += 1;
            continue;
        }
        let v0 = patch.edge_endpoint(e0, d0);
        let v1 = patch.edge_endpoint(e1, d1);
        let v2 = patch.edge_endpoint(e2, d2);
        if v0 >= num_vertices || v1 >= num_vertices || v2 >= num_vertices {
            log::debug!("[Validator] patch {} face {} corner vertex out of range", patch.patch_id(), face);
            errors += 1;
        } else if v0 == v1 || v1 == v2 || v0 == v2 {
            log::debug!("[Validator] patch {} face {} has coincident corners", patch.patch_id(), face);
            errors += 1;
        } else if !patch.vertices().is_active(v0)
            || !patch.vertices().is_active(v1)
            || !patch.vertices().is_active(v2)
        {
            log::debug!("[Validator] patch {} face {} corner vertex deleted", patch.patch_id(), face);
            errors += 1;
        }
    }
    errors
}
