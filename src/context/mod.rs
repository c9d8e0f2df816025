//! The global mesh view handed to every kernel.
//!
//! Read-mostly aggregate: global element counts, the array of per-patch
//! state, and SOA summary arrays (counts keyed by patch id) that the
//! host reconciler refreshes after mutation rounds so later launches see
//! updated bounds.

use crate::patch::{ElementKind, PatchInfo};

/// Structure-of-arrays per-patch count summaries, one entry per patch
/// id. Refreshed by [`update_host`](crate::host::update_host).
#[derive(Clone, Debug, Default)]
pub struct PatchSummaries {
    pub vertex_counts: Vec<u16>,
    pub edge_counts: Vec<u16>,
    pub face_counts: Vec<u16>,
    pub owned_vertex_counts: Vec<u32>,
    pub owned_edge_counts: Vec<u32>,
    pub owned_face_counts: Vec<u32>,
}

/// Global counts plus the whole partition.
pub struct MeshContext {
    patches: Vec<PatchInfo>,
    num_vertices: u32,
    num_edges: u32,
    num_faces: u32,
    summaries: PatchSummaries,
}

impl MeshContext {
    /// Assemble a context from built patches and the partitioner's
    /// global element counts.
    pub fn new(patches: Vec<PatchInfo>, num_vertices: u32, num_edges: u32, num_faces: u32) -> Self {
        let mut ctx = Self {
            patches,
            num_vertices,
            num_edges,
            num_faces,
            summaries: PatchSummaries::default(),
        };
        ctx.refresh_summaries();
        ctx
    }

    /// Assemble a context deriving the global counts from per-patch
    /// ownership (sum of live owned elements per kind).
    pub fn from_patches(patches: Vec<PatchInfo>) -> Self {
        let count = |kind: ElementKind| {
            patches.iter().map(|p| p.element_set(kind).live_owned_count()).sum::<u32>()
        };
        let (v, e, f) = (
            count(ElementKind::Vertex),
            count(ElementKind::Edge),
            count(ElementKind::Face),
        );
        Self::new(patches, v, e, f)
    }

    pub fn num_patches(&self) -> u32 {
        self.patches.len() as u32
    }

    pub fn num_elements(&self, kind: ElementKind) -> u32 {
        match kind {
            ElementKind::Vertex => self.num_vertices,
            ElementKind::Edge => self.num_edges,
            ElementKind::Face => self.num_faces,
        }
    }

    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    pub fn num_edges(&self) -> u32 {
        self.num_edges
    }

    pub fn num_faces(&self) -> u32 {
        self.num_faces
    }

    pub fn patch(&self, patch_id: u32) -> &PatchInfo {
        &self.patches[patch_id as usize]
    }

    pub fn patch_mut(&mut self, patch_id: u32) -> &mut PatchInfo {
        &mut self.patches[patch_id as usize]
    }

    pub fn patches(&self) -> &[PatchInfo] {
        &self.patches
    }

    pub fn summaries(&self) -> &PatchSummaries {
        &self.summaries
    }

    /// Recompute the SOA summary arrays from the per-patch state. The
    /// reconciler calls this after pulling device state back.
    pub fn refresh_summaries(&mut self) {
        let n = self.patches.len();
        let s = &mut self.summaries;
        s.vertex_counts.resize(n, 0);
        s.edge_counts.resize(n, 0);
        s.face_counts.resize(n, 0);
        s.owned_vertex_counts.resize(n, 0);
        s.owned_edge_counts.resize(n, 0);
        s.owned_face_counts.resize(n, 0);
        for (i, patch) in self.patches.iter().enumerate() {
            s.vertex_counts[i] = patch.vertices().num();
            s.edge_counts[i] = patch.edges().num();
            s.face_counts[i] = patch.faces().num();
            s.owned_vertex_counts[i] = patch.vertices().live_owned_count();
            s.owned_edge_counts[i] = patch.edges().live_owned_count();
            s.owned_face_counts[i] = patch.faces().live_owned_count();
        }
    }
}
