//! Not-owned mirroring.
//!
//! Every live ribbon copy must resolve through its LP entry to an owner
//! that actually claims ownership, is not deleted, and records the same
//! incidence: for faces, the same three edges with the same direction
//! tags (edge identity compared after ribbon resolution on both sides);
//! for edges, the same two endpoint vertices.

use crate::constants::INVALID_PATCH;
use crate::context::MeshContext;
use crate::kernel::KernelPool;
use crate::patch::{unpack_tagged, ElementKind, PatchInfo};
use std::sync::atomic::{AtomicU64, Ordering};

pub(super) fn run(ctx: &MeshContext, pool: &KernelPool) -> u64 {
    let errors = AtomicU64::new(0);
    pool.for_each_patch(ctx, |patch| {
        let found = check_ribbon_faces(ctx, patch) + check_ribbon_edges(ctx, patch);
        if found != 0 {
            errors.fetch_add(found, Ordering::Relaxed);
        }
    });
    errors.load(Ordering::Relaxed)
}

/// Resolve the owner-side copy of a live not-owned element. None covers
/// every owner-side inconsistency: missing LP entry, bad stash slot,
/// out-of-range owner index, owner not claiming ownership, or owner
/// deleted while the ribbon copy is still live.
fn owner_copy<'a>(
    ctx: &'a MeshContext,
    patch: &PatchInfo,
    kind: ElementKind,
    local: u16,
) -> Option<(&'a PatchInfo, u16)> {
    let pair = patch.element_set(kind).find_lp(local);
    if !pair.is_valid() {
        return None;
    }
    let owner_id = patch.stash().get_patch(pair.stash_slot());
    if owner_id == INVALID_PATCH || owner_id >= ctx.num_patches() {
        return None;
    }
    let owner = ctx.patch(owner_id);
    let owner_local = pair.owner_local();
    let set = owner.element_set(kind);
    if owner_local >= set.num() || !set.is_owned(owner_local) || !set.is_active(owner_local) {
        return None;
    }
    Some((owner, owner_local))
}

fn check_ribbon_faces(ctx: &MeshContext, patch: &PatchInfo) -> u64 {
    let mut errors = 0;
    for face in 0..patch.faces().num() {
        if !patch.faces().is_active(face) || patch.faces().is_owned(face) {
            continue;
        }
        let (owner, owner_face) = match owner_copy(ctx, patch, ElementKind::Face, face) {
            Some(found) => found,
            None => {
                log::debug!(
                    "[Validator] patch {} ribbon face {} has no consistent owner",
                    patch.patch_id(),
                    face
                );
                errors += 1;
                continue;
            }
        };
        let local_edges = patch.face_edges(face);
        let owner_edges = owner.face_edges(owner_face);
        for slot in 0..3 {
            let (local_edge, local_dir) = local_edges[slot];
            let (owner_edge, owner_dir) = owner_edges[slot];
            if local_dir != owner_dir {
                log::debug!(
                    "[Validator] patch {} face {} slot {} direction tag differs from owner",
                    patch.patch_id(),
                    face,
                    slot
                );
                errors += 1;
                continue;
            }
            let local_handle = patch.resolve(ElementKind::Edge, local_edge);
            let owner_handle = owner.resolve(ElementKind::Edge, owner_edge);
            if !local_handle.is_valid() || local_handle != owner_handle {
                log::debug!(
                    "[Validator] patch {} face {} slot {} edge identity differs from owner",
                    patch.patch_id(),
                    face,
                    slot
                );
                errors += 1;
            }
        }
    }
    errors
}

fn check_ribbon_edges(ctx: &MeshContext, patch: &PatchInfo) -> u64 {
    let mut errors = 0;
    for edge in 0..patch.edges().num() {
        if !patch.edges().is_active(edge) || patch.edges().is_owned(edge) {
            continue;
        }
        let (owner, owner_edge) = match owner_copy(ctx, patch, ElementKind::Edge, edge) {
            Some(found) => found,
            None => {
                log::debug!(
                    "[Validator] patch {} ribbon edge {} has no consistent owner",
                    patch.patch_id(),
                    edge
                );
                errors += 1;
                continue;
            }
        };
        for slot in 0..2 {
            let (local_vertex, local_dir) = unpack_tagged(patch.ev_tagged(edge, slot));
            let (owner_vertex, owner_dir) = unpack_tagged(owner.ev_tagged(owner_edge, slot));
            if local_dir != owner_dir {
                errors += 1;
                continue;
            }
            let local_handle = patch.resolve(ElementKind::Vertex, local_vertex);
            let owner_handle = owner.resolve(ElementKind::Vertex, owner_vertex);
            if !local_handle.is_valid() || local_handle != owner_handle {
                log::debug!(
                    "[Validator] patch {} edge {} endpoint {} differs from owner",
                    patch.patch_id(),
                    edge,
                    slot
                );
                errors += 1;
            }
        }
    }
    errors
}
