//! Handle-keyed attribute storage.
//!
//! Maps an element handle plus a small per-element slot to a value,
//! backed by dense per-patch arrays sized to the patch's element
//! capacity. Kernels that stage globally derived data (the ribbon
//! check's vertex-to-face adjacency) write through shared references, so
//! the value type is typically an atomic.

use crate::context::MeshContext;
use crate::patch::{ElementHandle, ElementKind};

/// Per-element slotted storage across the whole partition.
pub struct PatchAttribute<T> {
    stride: usize,
    per_patch: Vec<Vec<T>>,
}

impl<T> PatchAttribute<T> {
    /// Allocate `stride` slots per element of `kind`, each initialized
    /// by `init`. Sized to current capacities; reallocate after growth.
    pub fn new_with<F>(ctx: &MeshContext, kind: ElementKind, stride: usize, init: F) -> Self
    where
        F: Fn() -> T,
    {
        assert!(stride > 0, "attribute stride must be positive");
        let per_patch = ctx
            .patches()
            .iter()
            .map(|patch| {
                let len = patch.element_set(kind).capacity() as usize * stride;
                (0..len).map(|_| init()).collect()
            })
            .collect();
        Self { stride, per_patch }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Shared reference to one slot. Atomic value types make this a
    /// mutable slot under concurrency.
    #[inline]
    pub fn slot(&self, handle: ElementHandle, index: usize) -> &T {
        assert!(index < self.stride, "attribute slot {} out of stride {}", index, self.stride);
        &self.per_patch[handle.patch() as usize][handle.local() as usize * self.stride + index]
    }

    /// Exclusive reference to one slot.
    #[inline]
    pub fn slot_mut(&mut self, handle: ElementHandle, index: usize) -> &mut T {
        assert!(index < self.stride, "attribute slot {} out of stride {}", index, self.stride);
        &mut self.per_patch[handle.patch() as usize][handle.local() as usize * self.stride + index]
    }
}

impl<T: Clone> PatchAttribute<T> {
    /// Allocate with a cloned fill value.
    pub fn new(ctx: &MeshContext, kind: ElementKind, stride: usize, fill: T) -> Self {
        Self::new_with(ctx, kind, stride, || fill.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchInfo;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn two_patch_ctx() -> MeshContext {
        let mut p0 = PatchInfo::new(0, 4, 4, 4);
        p0.add_vertex(true).unwrap();
        let mut p1 = PatchInfo::new(1, 4, 4, 4);
        p1.add_vertex(true).unwrap();
        p1.add_vertex(true).unwrap();
        MeshContext::from_patches(vec![p0, p1])
    }

    #[test]
    fn slots_are_independent_per_handle() {
        let ctx = two_patch_ctx();
        let mut attr = PatchAttribute::new(&ctx, ElementKind::Vertex, 2, 0u32);
        *attr.slot_mut(ElementHandle::new(0, 0), 0) = 10;
        *attr.slot_mut(ElementHandle::new(1, 0), 1) = 20;
        assert_eq!(*attr.slot(ElementHandle::new(0, 0), 0), 10);
        assert_eq!(*attr.slot(ElementHandle::new(0, 0), 1), 0);
        assert_eq!(*attr.slot(ElementHandle::new(1, 0), 1), 20);
    }

    #[test]
    fn atomic_values_mutate_through_shared_refs() {
        let ctx = two_patch_ctx();
        let attr = PatchAttribute::new_with(&ctx, ElementKind::Vertex, 1, || AtomicU32::new(0));
        attr.slot(ElementHandle::new(1, 1), 0).fetch_add(3, Ordering::Relaxed);
        assert_eq!(attr.slot(ElementHandle::new(1, 1), 0).load(Ordering::Relaxed), 3);
    }
}
