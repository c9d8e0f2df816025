//! Shared synthetic partitions for integration tests.

use patchmesh::{MeshContext, PatchInfo};

/// A quad split into two triangles, partitioned across two patches with
/// full ribbon overlap.
///
/// Vertices A, B, C, D; edges AB, BC, CA, CD, DA; faces F0 = (A,B,C)
/// and F1 = (A,C,D) sharing edge CA.
///
/// Patch 0 owns A, B, C, AB, BC, CA, and F0; patch 1 owns D, CD, DA,
/// and F1. Both patches carry ribbon copies of everything they do not
/// own, because A and C are incident to faces owned on both sides.
///
/// Local layouts (index: element):
/// - patch 0 vertices: 0 A, 1 B, 2 C, 3 D(ribbon)
/// - patch 0 edges: 0 AB, 1 BC, 2 CA, 3 CD(ribbon), 4 DA(ribbon)
/// - patch 0 faces: 0 F0, 1 F1(ribbon)
/// - patch 1 vertices: 0 D, 1 A(ribbon), 2 C(ribbon), 3 B(ribbon)
/// - patch 1 edges: 0 CD, 1 DA, 2 CA(ribbon), 3 AB(ribbon), 4 BC(ribbon)
/// - patch 1 faces: 0 F1, 1 F0(ribbon)
pub fn two_patch_quad() -> MeshContext {
    let mut p0 = PatchInfo::new(0, 8, 8, 4);
    p0.add_vertex(true).unwrap(); // 0: A
    p0.add_vertex(true).unwrap(); // 1: B
    p0.add_vertex(true).unwrap(); // 2: C
    p0.add_ribbon_vertex(1, 0).unwrap(); // 3: D, owned by patch 1
    p0.add_edge(0, 1, true).unwrap(); // 0: AB
    p0.add_edge(1, 2, true).unwrap(); // 1: BC
    p0.add_edge(2, 0, true).unwrap(); // 2: CA
    p0.add_ribbon_edge(1, 0, 2, 3).unwrap(); // 3: CD
    p0.add_ribbon_edge(1, 1, 3, 0).unwrap(); // 4: DA
    p0.add_face([(0, false), (1, false), (2, false)], true).unwrap(); // 0: F0
    p0.add_ribbon_face(1, 0, [(2, true), (3, false), (4, false)]).unwrap(); // 1: F1

    let mut p1 = PatchInfo::new(1, 8, 8, 4);
    p1.add_vertex(true).unwrap(); // 0: D
    p1.add_ribbon_vertex(0, 0).unwrap(); // 1: A
    p1.add_ribbon_vertex(0, 2).unwrap(); // 2: C
    p1.add_ribbon_vertex(0, 1).unwrap(); // 3: B
    p1.add_edge(2, 0, true).unwrap(); // 0: CD
    p1.add_edge(0, 1, true).unwrap(); // 1: DA
    p1.add_ribbon_edge(0, 2, 2, 1).unwrap(); // 2: CA
    p1.add_ribbon_edge(0, 0, 1, 3).unwrap(); // 3: AB
    p1.add_ribbon_edge(0, 1, 3, 2).unwrap(); // 4: BC
    p1.add_face([(2, true), (0, false), (1, false)], true).unwrap(); // 0: F1
    p1.add_ribbon_face(0, 0, [(3, false), (4, false), (2, false)]).unwrap(); // 1: F0

    MeshContext::new(vec![p0, p1], 4, 5, 2)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
