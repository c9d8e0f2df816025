//! Per-patch topology and bookkeeping.
//!
//! A patch is the unit of replication and of parallel work: local copies
//! of its edge-to-vertex and face-to-edge incidence, one
//! [`ElementSet`] per element kind (active mask, owned mask, LP table),
//! and the stash of neighbor patch ids. Everything a block needs to
//! answer neighborhood queries without global synchronization.

mod element_set;

pub use element_set::ElementSet;

use crate::constants::{INVALID_LOCAL, INVALID_PATCH, MAX_ELEMENTS_PER_PATCH};
use crate::error::{MeshError, MeshResult};
use crate::lp::{LpHashTable, LpPair, PatchStash};

/// The three mesh element kinds.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ElementKind {
    Vertex,
    Edge,
    Face,
}

impl ElementKind {
    pub const ALL: [ElementKind; 3] = [ElementKind::Vertex, ElementKind::Edge, ElementKind::Face];
}

/// Global identity of one mesh element: owning patch plus local index
/// within that patch.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ElementHandle {
    patch: u32,
    local: u16,
}

impl ElementHandle {
    pub const INVALID: ElementHandle = ElementHandle { patch: INVALID_PATCH, local: INVALID_LOCAL };

    pub fn new(patch: u32, local: u16) -> Self {
        Self { patch, local }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.patch != INVALID_PATCH
    }

    #[inline]
    pub fn patch(self) -> u32 {
        self.local_checked();
        self.patch
    }

    #[inline]
    pub fn local(self) -> u16 {
        self.local_checked();
        self.local
    }

    #[inline]
    fn local_checked(self) {
        debug_assert!(self.is_valid(), "dereferencing an invalid element handle");
    }

    /// Pack into one word for staging in attribute storage.
    #[inline]
    pub fn to_bits(self) -> u64 {
        ((self.patch as u64) << 32) | self.local as u64
    }

    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        Self { patch: (bits >> 32) as u32, local: bits as u16 }
    }
}

/// Tag a local index with a direction bit.
#[inline]
pub fn pack_tagged(index: u16, dir: bool) -> u16 {
    debug_assert!(index < MAX_ELEMENTS_PER_PATCH, "tagged index {} out of range", index);
    (index << 1) | dir as u16
}

/// The one canonical decode for direction-tagged indices. Used
/// everywhere a tagged `ev`/`fe` entry is read.
#[inline]
pub fn unpack_tagged(tagged: u16) -> (u16, bool) {
    (tagged >> 1, tagged & 1 == 1)
}

/// All per-patch state: counts, topology, masks, LP tables, stash.
#[derive(Clone)]
pub struct PatchInfo {
    patch_id: u32,
    vertices: ElementSet,
    edges: ElementSet,
    faces: ElementSet,
    /// Two direction-tagged local vertex indices per edge slot.
    ev: Vec<u16>,
    /// Three direction-tagged local edge indices per face slot.
    fe: Vec<u16>,
    stash: PatchStash,
}

impl PatchInfo {
    pub fn new(patch_id: u32, vertex_capacity: u16, edge_capacity: u16, face_capacity: u16) -> Self {
        Self {
            patch_id,
            vertices: ElementSet::new(ElementKind::Vertex, patch_id, vertex_capacity),
            edges: ElementSet::new(ElementKind::Edge, patch_id, edge_capacity),
            faces: ElementSet::new(ElementKind::Face, patch_id, face_capacity),
            ev: vec![0; edge_capacity as usize * 2],
            fe: vec![0; face_capacity as usize * 3],
            stash: PatchStash::new(),
        }
    }

    pub fn patch_id(&self) -> u32 {
        self.patch_id
    }

    pub fn element_set(&self, kind: ElementKind) -> &ElementSet {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
            ElementKind::Face => &self.faces,
        }
    }

    pub fn element_set_mut(&mut self, kind: ElementKind) -> &mut ElementSet {
        match kind {
            ElementKind::Vertex => &mut self.vertices,
            ElementKind::Edge => &mut self.edges,
            ElementKind::Face => &mut self.faces,
        }
    }

    pub fn vertices(&self) -> &ElementSet {
        &self.vertices
    }

    pub fn edges(&self) -> &ElementSet {
        &self.edges
    }

    pub fn faces(&self) -> &ElementSet {
        &self.faces
    }

    pub fn stash(&self) -> &PatchStash {
        &self.stash
    }

    pub fn lp(&self, kind: ElementKind) -> &LpHashTable {
        self.element_set(kind).lp()
    }

    // ---- construction ----

    /// Append an owned or ribbon-placeholder vertex slot.
    pub fn add_vertex(&mut self, owned: bool) -> MeshResult<u16> {
        self.vertices.push(owned)
    }

    /// Append an edge between two local vertex indices. Slot 0 carries
    /// direction tag 0, slot 1 tag 1; a face whose `fe` entry has tag
    /// `d` takes its corner vertex from slot `d`.
    pub fn add_edge(&mut self, v0: u16, v1: u16, owned: bool) -> MeshResult<u16> {
        assert!(v0 < self.vertices.num() && v1 < self.vertices.num(), "edge endpoints out of range");
        let edge = self.edges.push(owned)?;
        self.ev[edge as usize * 2] = pack_tagged(v0, false);
        self.ev[edge as usize * 2 + 1] = pack_tagged(v1, true);
        Ok(edge)
    }

    /// Append a face from three direction-tagged local edges.
    pub fn add_face(&mut self, edges: [(u16, bool); 3], owned: bool) -> MeshResult<u16> {
        for &(edge, _) in &edges {
            assert!(edge < self.edges.num(), "face edge out of range");
        }
        let face = self.faces.push(owned)?;
        for (slot, &(edge, dir)) in edges.iter().enumerate() {
            self.fe[face as usize * 3 + slot] = pack_tagged(edge, dir);
        }
        Ok(face)
    }

    /// Record the owner of a not-owned local element: stash the owner
    /// patch id and insert the LP entry, growing the LP table when an
    /// insertion reports it full.
    fn link_owner(&mut self, kind: ElementKind, local: u16, owner_patch: u32, owner_local: u16) -> MeshResult<()> {
        let slot = self.stash.insert(owner_patch).ok_or(MeshError::PatchStashFull {
            patch: self.patch_id,
            neighbor: owner_patch,
        })?;
        let pair = LpPair::new(local, owner_local, slot);
        loop {
            match self.element_set_mut(kind).try_insert_lp(pair) {
                Ok(()) => return Ok(()),
                Err(MeshError::LpTableFull { .. }) => {
                    log::debug!(
                        "[Patch {}] growing {:?} LP table past {}",
                        self.patch_id,
                        kind,
                        self.element_set(kind).lp().capacity()
                    );
                    self.element_set_mut(kind).lp_mut().grow();
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Append a ribbon copy of a vertex owned by another patch.
    pub fn add_ribbon_vertex(&mut self, owner_patch: u32, owner_local: u16) -> MeshResult<u16> {
        let local = self.vertices.push(false)?;
        self.link_owner(ElementKind::Vertex, local, owner_patch, owner_local)?;
        Ok(local)
    }

    /// Append a ribbon copy of an edge owned by another patch.
    pub fn add_ribbon_edge(&mut self, owner_patch: u32, owner_local: u16, v0: u16, v1: u16) -> MeshResult<u16> {
        let local = self.add_edge(v0, v1, false)?;
        self.link_owner(ElementKind::Edge, local, owner_patch, owner_local)?;
        Ok(local)
    }

    /// Append a ribbon copy of a face owned by another patch.
    pub fn add_ribbon_face(
        &mut self,
        owner_patch: u32,
        owner_local: u16,
        edges: [(u16, bool); 3],
    ) -> MeshResult<u16> {
        let local = self.add_face(edges, false)?;
        self.link_owner(ElementKind::Face, local, owner_patch, owner_local)?;
        Ok(local)
    }

    /// Tombstone one element.
    pub fn delete(&mut self, kind: ElementKind, local: u16) {
        self.element_set_mut(kind).delete(local);
    }

    // ---- topology reads (canonical decode only) ----

    /// Direction-tagged edges of face `face`, in stored order.
    pub fn face_edges(&self, face: u16) -> [(u16, bool); 3] {
        assert!(face < self.faces.num(), "face {} out of range", face);
        let base = face as usize * 3;
        [
            unpack_tagged(self.fe[base]),
            unpack_tagged(self.fe[base + 1]),
            unpack_tagged(self.fe[base + 2]),
        ]
    }

    /// Local vertex at endpoint `dir` of edge `edge`.
    pub fn edge_endpoint(&self, edge: u16, dir: bool) -> u16 {
        assert!(edge < self.edges.num(), "edge {} out of range", edge);
        let (vertex, _) = unpack_tagged(self.ev[edge as usize * 2 + dir as usize]);
        vertex
    }

    /// Raw tagged `ev` entry, for the mirroring check and bulk transfer.
    pub fn ev_tagged(&self, edge: u16, slot: usize) -> u16 {
        assert!(edge < self.edges.num() && slot < 2);
        self.ev[edge as usize * 2 + slot]
    }

    /// Resolve a local index to its global identity: the patch itself
    /// when owned, otherwise the LP entry plus stash indirection.
    pub fn resolve(&self, kind: ElementKind, local: u16) -> ElementHandle {
        let set = self.element_set(kind);
        if set.is_owned(local) {
            return ElementHandle::new(self.patch_id, local);
        }
        let pair = set.find_lp(local);
        if !pair.is_valid() {
            return ElementHandle::INVALID;
        }
        let owner = self.stash.get_patch(pair.stash_slot());
        if owner == INVALID_PATCH {
            return ElementHandle::INVALID;
        }
        ElementHandle::new(owner, pair.owner_local())
    }

    // ---- capacity growth ----

    /// Grow one element kind's capacity, resizing the incidence arrays
    /// that key off it. Grow-only.
    pub fn grow(&mut self, kind: ElementKind, new_capacity: u16) {
        self.element_set_mut(kind).grow(new_capacity);
        match kind {
            ElementKind::Vertex => {}
            ElementKind::Edge => self.ev.resize(new_capacity as usize * 2, 0),
            ElementKind::Face => self.fe.resize(new_capacity as usize * 3, 0),
        }
    }

    // ---- raw transfer surface ----

    pub fn ev_raw(&self) -> &[u16] {
        &self.ev
    }

    pub fn fe_raw(&self) -> &[u16] {
        &self.fe
    }

    pub fn ev_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.ev)
    }

    pub fn fe_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.fe)
    }

    // ---- targeted mutation, for edit kernels and fault injection ----

    /// Overwrite one tagged `fe` slot.
    pub fn set_face_edge(&mut self, face: u16, slot: usize, edge: u16, dir: bool) {
        assert!(face < self.faces.num() && slot < 3);
        self.fe[face as usize * 3 + slot] = pack_tagged(edge, dir);
    }

    /// Overwrite one tagged `ev` slot.
    pub fn set_edge_vertex(&mut self, edge: u16, slot: usize, vertex: u16, dir: bool) {
        assert!(edge < self.edges.num() && slot < 2);
        self.ev[edge as usize * 2 + slot] = pack_tagged(vertex, dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_compares_unequal_to_every_valid_handle() {
        assert!(!ElementHandle::INVALID.is_valid());
        for patch in [0u32, 1, 1000] {
            for local in [0u16, 3, 4095] {
                assert_ne!(ElementHandle::new(patch, local), ElementHandle::INVALID);
            }
        }
        assert_eq!(ElementHandle::new(2, 7), ElementHandle::new(2, 7));
        assert_ne!(ElementHandle::new(2, 7), ElementHandle::new(3, 7));
        assert_ne!(ElementHandle::new(2, 7), ElementHandle::new(2, 8));
    }

    #[test]
    fn handle_bits_round_trip() {
        let handle = ElementHandle::new(41, 4095);
        assert_eq!(ElementHandle::from_bits(handle.to_bits()), handle);
    }

    #[test]
    fn tagged_pack_unpack_is_canonical() {
        for index in [0u16, 1, 500, 4095] {
            for dir in [false, true] {
                assert_eq!(unpack_tagged(pack_tagged(index, dir)), (index, dir));
            }
        }
    }

    #[test]
    fn single_triangle_topology() {
        let mut patch = PatchInfo::new(0, 8, 8, 4);
        let v: Vec<u16> = (0..3).map(|_| patch.add_vertex(true).unwrap()).collect();
        let e0 = patch.add_edge(v[0], v[1], true).unwrap();
        let e1 = patch.add_edge(v[1], v[2], true).unwrap();
        let e2 = patch.add_edge(v[2], v[0], true).unwrap();
        let f = patch.add_face([(e0, false), (e1, false), (e2, false)], true).unwrap();

        assert_eq!(patch.face_edges(f), [(e0, false), (e1, false), (e2, false)]);
        assert_eq!(patch.edge_endpoint(e0, false), v[0]);
        assert_eq!(patch.edge_endpoint(e0, true), v[1]);
        assert_eq!(patch.resolve(ElementKind::Face, f), ElementHandle::new(0, f));
    }

    #[test]
    fn ribbon_resolution_goes_through_stash() {
        let mut patch = PatchInfo::new(3, 8, 8, 4);
        let rv = patch.add_ribbon_vertex(7, 2).unwrap();
        assert_eq!(patch.resolve(ElementKind::Vertex, rv), ElementHandle::new(7, 2));
        assert_eq!(patch.stash().find(7), Some(0));
    }

    #[test]
    fn grow_keeps_topology_readable() {
        let mut patch = PatchInfo::new(0, 4, 4, 2);
        let v0 = patch.add_vertex(true).unwrap();
        let v1 = patch.add_vertex(true).unwrap();
        let e = patch.add_edge(v0, v1, true).unwrap();
        patch.grow(ElementKind::Edge, 16);
        assert_eq!(patch.edges().capacity(), 16);
        assert_eq!(patch.edge_endpoint(e, false), v0);
        assert_eq!(patch.edge_endpoint(e, true), v1);
    }
}
