//! Ribbon completeness.
//!
//! Two obligations: (a) every owned live edge is incident to at least
//! one owned live face within its own patch: owned faces atomically
//! mark their three edges, then unmarked owned edges are flagged;
//! (b) the true global vertex-to-face adjacency, staged once into
//! attribute storage at a fixed width of the maximum valence, must be
//! fully discoverable from each patch's local vertex-to-face transpose
//! after ribbon resolution.

use crate::attributes::PatchAttribute;
use crate::context::MeshContext;
use crate::kernel::KernelPool;
use crate::patch::{ElementHandle, ElementKind, PatchInfo};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Fill value for unused adjacency slots.
const EMPTY_SLOT: u64 = u64::MAX;

pub(super) fn run(ctx: &MeshContext, pool: &KernelPool) -> u64 {
    let errors = AtomicU64::new(0);

    // (a) owned edges must see an owned face in the same patch.
    pool.for_each_patch(ctx, |patch| {
        let found = check_owned_edge_incidence(patch);
        if found != 0 {
            errors.fetch_add(found, Ordering::Relaxed);
        }
    });

    // (b) local vertex-face adjacency covers the global one.
    errors.fetch_add(check_vertex_face_coverage(ctx, pool), Ordering::Relaxed);

    errors.load(Ordering::Relaxed)
}

fn check_owned_edge_incidence(patch: &PatchInfo) -> u64 {
    let edges = patch.edges();
    let faces = patch.faces();
    // Shared marks: several faces may touch the same edge concurrently,
    // so the increments are atomic. The parallel loop completing is the
    // barrier before the marks are read.
    let marks: Vec<AtomicU32> = (0..edges.num() as usize).map(|_| AtomicU32::new(0)).collect();
    let stray = AtomicU64::new(0);
    (0..faces.num() as u32).into_par_iter().for_each(|face| {
        let face = face as u16;
        if !faces.is_active(face) || !faces.is_owned(face) {
            return;
        }
        for (edge, _dir) in patch.face_edges(face) {
            if edge < edges.num() {
                marks[edge as usize].fetch_add(1, Ordering::Relaxed);
            } else {
                log::debug!(
                    "[Validator] patch {} face {} edge index {} out of range",
                    patch.patch_id(),
                    face,
                    edge
                );
                stray.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let mut errors = stray.load(Ordering::Relaxed);
    for edge in 0..edges.num() {
        if edges.is_active(edge)
            && edges.is_owned(edge)
            && marks[edge as usize].load(Ordering::Relaxed) == 0
        {
            log::debug!(
                "[Validator] patch {} owned edge {} has no owned incident face",
                patch.patch_id(),
                edge
            );
            errors += 1;
        }
    }
    errors
}

/// Corner vertices of a face: the direction tag of each `fe` entry
/// selects the edge endpoint. None when an edge or corner index points
/// past its element set; the uniqueness check reports those faces.
fn face_corners(patch: &PatchInfo, face: u16) -> Option<[u16; 3]> {
    let [(e0, d0), (e1, d1), (e2, d2)] = patch.face_edges(face);
    let num_edges = patch.edges().num();
    if e0 >= num_edges || e1 >= num_edges || e2 >= num_edges {
        return None;
    }
    let corners = [
        patch.edge_endpoint(e0, d0),
        patch.edge_endpoint(e1, d1),
        patch.edge_endpoint(e2, d2),
    ];
    let num_vertices = patch.vertices().num();
    if corners.iter().any(|&v| v >= num_vertices) {
        return None;
    }
    Some(corners)
}

fn for_each_live_owned_face(patch: &PatchInfo, mut body: impl FnMut(u16)) {
    for face in 0..patch.faces().num() {
        if patch.faces().is_active(face) && patch.faces().is_owned(face) {
            body(face);
        }
    }
}

fn check_vertex_face_coverage(ctx: &MeshContext, pool: &KernelPool) -> u64 {
    // Pass 1: per-vertex valence under the true global adjacency.
    let valence = PatchAttribute::new_with(ctx, ElementKind::Vertex, 1, || AtomicU32::new(0));
    pool.for_each_patch(ctx, |patch| {
        for_each_live_owned_face(patch, |face| {
            let corners = match face_corners(patch, face) {
                Some(corners) => corners,
                None => return,
            };
            for corner in corners {
                let handle = patch.resolve(ElementKind::Vertex, corner);
                if handle.is_valid() {
                    valence.slot(handle, 0).fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    });

    let mut max_valence = 0usize;
    for patch in ctx.patches() {
        for vertex in 0..patch.vertices().num() {
            let handle = ElementHandle::new(patch.patch_id(), vertex);
            max_valence = max_valence.max(valence.slot(handle, 0).load(Ordering::Relaxed) as usize);
        }
    }
    if max_valence == 0 {
        return 0;
    }

    // Pass 2: stage the fixed-width global vertex-face lists.
    let cursors = PatchAttribute::new_with(ctx, ElementKind::Vertex, 1, || AtomicU32::new(0));
    let adjacency =
        PatchAttribute::new_with(ctx, ElementKind::Vertex, max_valence, || AtomicU64::new(EMPTY_SLOT));
    pool.for_each_patch(ctx, |patch| {
        for_each_live_owned_face(patch, |face| {
            let corners = match face_corners(patch, face) {
                Some(corners) => corners,
                None => return,
            };
            let face_handle = ElementHandle::new(patch.patch_id(), face);
            for corner in corners {
                let handle = patch.resolve(ElementKind::Vertex, corner);
                if !handle.is_valid() {
                    continue;
                }
                let slot = cursors.slot(handle, 0).fetch_add(1, Ordering::Relaxed) as usize;
                adjacency.slot(handle, slot).store(face_handle.to_bits(), Ordering::Relaxed);
            }
        });
    });

    // Pass 3: per patch, transpose the local face-vertex incidence into
    // block scratch, then confirm every staged global neighbor is
    // reachable locally.
    let errors = AtomicU64::new(0);
    pool.for_each_patch(ctx, |patch| {
        let mut local_vf: Vec<Vec<u64>> = vec![Vec::new(); patch.vertices().num() as usize];
        for face in 0..patch.faces().num() {
            if !patch.faces().is_active(face) {
                continue;
            }
            let corners = match face_corners(patch, face) {
                Some(corners) => corners,
                None => continue,
            };
            let face_bits = patch.resolve(ElementKind::Face, face).to_bits();
            for corner in corners {
                local_vf[corner as usize].push(face_bits);
            }
        }

        let mut found = 0u64;
        for_each_live_owned_face(patch, |face| {
            let corners = match face_corners(patch, face) {
                Some(corners) => corners,
                None => {
                    found += 1;
                    return;
                }
            };
            for corner in corners {
                let handle = patch.resolve(ElementKind::Vertex, corner);
                if !handle.is_valid() {
                    found += 1;
                    return;
                }
                for slot in 0..max_valence {
                    let neighbor = adjacency.slot(handle, slot).load(Ordering::Relaxed);
                    if neighbor == EMPTY_SLOT {
                        break;
                    }
                    if !local_vf[corner as usize].contains(&neighbor) {
                        log::debug!(
                            "[Validator] patch {} vertex {} misses global neighbor face {:?}",
                            patch.patch_id(),
                            corner,
                            ElementHandle::from_bits(neighbor)
                        );
                        found += 1;
                    }
                }
            }
        });
        if found != 0 {
            errors.fetch_add(found, Ordering::Relaxed);
        }
    });
    errors.load(Ordering::Relaxed)
}
