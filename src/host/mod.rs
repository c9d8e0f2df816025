//! Host-side mirrors and the reconciliation routine.
//!
//! After a round of device-side mutation, [`update_host`] pulls each
//! patch's authoritative counts, topology, masks, stash, and LP storage
//! into host-resident mirrors, growing host buffers as needed (never
//! shrinking), recomputes per-patch owned counts and their prefix sums,
//! checks the totals against the global counts, and pushes refreshed
//! count summaries back to the device-resident summary arrays.

use crate::constants::{INVALID_PATCH, PATCH_STASH_CAPACITY};
use crate::context::MeshContext;
use crate::error::{MeshError, MeshResult};
use crate::lp::LpPair;
use crate::patch::{ElementKind, ElementSet, PatchInfo};

/// Host mirror of one element set: counts, mask words, and raw LP
/// storage (main table plus overflow stash).
#[derive(Clone)]
pub struct ElementMirror {
    pub count: u16,
    pub capacity: u16,
    pub active_words: Vec<u32>,
    pub owned_words: Vec<u32>,
    pub lp_capacity: usize,
    pub lp_table: Vec<LpPair>,
    pub lp_stash: Vec<LpPair>,
}

impl ElementMirror {
    fn empty() -> Self {
        Self {
            count: 0,
            capacity: 0,
            active_words: Vec::new(),
            owned_words: Vec::new(),
            lp_capacity: 0,
            lp_table: Vec::new(),
            lp_stash: Vec::new(),
        }
    }

    fn pull_from(&mut self, set: &ElementSet) {
        self.count = set.num();
        // Capacities only grow across reconciliation rounds.
        if set.capacity() > self.capacity {
            self.capacity = set.capacity();
        }
        copy_grow_only(&mut self.active_words, &set.active_mask().as_words());
        copy_grow_only(&mut self.owned_words, &set.owned_mask().as_words());
        self.lp_capacity = set.lp().capacity();
        copy_grow_only_pairs(&mut self.lp_table, set.lp().raw_table());
        copy_grow_only_pairs(&mut self.lp_stash, set.lp().raw_stash());
    }

    /// Live owned elements recomputed from the mirrored mask words.
    pub fn live_owned_count(&self) -> u32 {
        let mut count = 0u32;
        let full_words = self.count as usize / 32;
        for word in 0..full_words {
            count += (self.active_words[word] & self.owned_words[word]).count_ones();
        }
        let tail = self.count as usize % 32;
        if tail != 0 {
            let mask = (1u32 << tail) - 1;
            count += (self.active_words[full_words] & self.owned_words[full_words] & mask).count_ones();
        }
        count
    }
}

fn copy_grow_only(dst: &mut Vec<u32>, src: &[u32]) {
    if dst.len() < src.len() {
        dst.resize(src.len(), 0);
    }
    dst[..src.len()].copy_from_slice(src);
    for word in dst[src.len()..].iter_mut() {
        *word = 0;
    }
}

fn copy_grow_only_pairs(dst: &mut Vec<LpPair>, src: &[LpPair]) {
    if dst.len() < src.len() {
        dst.resize(src.len(), LpPair::INVALID);
    }
    dst[..src.len()].copy_from_slice(src);
    for entry in dst[src.len()..].iter_mut() {
        *entry = LpPair::INVALID;
    }
}

fn copy_grow_only_u16(dst: &mut Vec<u16>, src: &[u16]) {
    if dst.len() < src.len() {
        dst.resize(src.len(), 0);
    }
    dst[..src.len()].copy_from_slice(src);
    for value in dst[src.len()..].iter_mut() {
        *value = 0;
    }
}

/// Host mirror of one patch.
#[derive(Clone)]
pub struct PatchMirror {
    pub vertices: ElementMirror,
    pub edges: ElementMirror,
    pub faces: ElementMirror,
    pub ev: Vec<u16>,
    pub fe: Vec<u16>,
    pub stash: [u32; PATCH_STASH_CAPACITY],
}

impl PatchMirror {
    fn empty() -> Self {
        Self {
            vertices: ElementMirror::empty(),
            edges: ElementMirror::empty(),
            faces: ElementMirror::empty(),
            ev: Vec::new(),
            fe: Vec::new(),
            stash: [INVALID_PATCH; PATCH_STASH_CAPACITY],
        }
    }

    fn pull_from(&mut self, patch: &PatchInfo) {
        self.vertices.pull_from(patch.vertices());
        self.edges.pull_from(patch.edges());
        self.faces.pull_from(patch.faces());
        copy_grow_only_u16(&mut self.ev, patch.ev_raw());
        copy_grow_only_u16(&mut self.fe, patch.fe_raw());
        self.stash = *patch.stash().raw();
    }

    pub fn element(&self, kind: ElementKind) -> &ElementMirror {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
            ElementKind::Face => &self.faces,
        }
    }
}

/// Host-resident view of the whole partition plus the dense-index
/// bookkeeping derived from it.
pub struct HostMirror {
    patches: Vec<PatchMirror>,
    owned_counts: [Vec<u32>; 3],
    /// Per kind, exclusive prefix over owned counts, length
    /// `num_patches + 1`; the last entry is the total and assigns each
    /// owned element a dense global index for attribute storage.
    prefix_sums: [Vec<u32>; 3],
}

impl HostMirror {
    pub fn new(num_patches: u32) -> Self {
        let n = num_patches as usize;
        Self {
            patches: (0..n).map(|_| PatchMirror::empty()).collect(),
            owned_counts: [vec![0; n], vec![0; n], vec![0; n]],
            prefix_sums: [vec![0; n + 1], vec![0; n + 1], vec![0; n + 1]],
        }
    }

    pub fn num_patches(&self) -> u32 {
        self.patches.len() as u32
    }

    pub fn patch(&self, patch_id: u32) -> &PatchMirror {
        &self.patches[patch_id as usize]
    }

    fn kind_index(kind: ElementKind) -> usize {
        match kind {
            ElementKind::Vertex => 0,
            ElementKind::Edge => 1,
            ElementKind::Face => 2,
        }
    }

    pub fn owned_counts(&self, kind: ElementKind) -> &[u32] {
        &self.owned_counts[Self::kind_index(kind)]
    }

    pub fn prefix_sums(&self, kind: ElementKind) -> &[u32] {
        &self.prefix_sums[Self::kind_index(kind)]
    }

    /// Dense global index of an owned element, from the prefix sums.
    pub fn dense_index(&self, kind: ElementKind, patch_id: u32, owned_rank: u32) -> u32 {
        self.prefix_sums[Self::kind_index(kind)][patch_id as usize] + owned_rank
    }
}

/// Reconcile host mirrors with the latest device-resident patch state.
///
/// Fails without touching anything when the device reports a different
/// patch count than the mirror was built for; patch-count changes do not
/// go through this path. A prefix-sum total that misses the global count
/// is the internal-consistency safety net: the pass still completes and
/// the error is surfaced to the caller afterwards.
pub fn update_host(ctx: &mut MeshContext, host: &mut HostMirror) -> MeshResult<()> {
    if ctx.num_patches() != host.num_patches() {
        log::error!(
            "[Reconcile] patch count changed: host {}, device {}",
            host.num_patches(),
            ctx.num_patches()
        );
        return Err(MeshError::PatchCountChanged {
            host: host.num_patches(),
            device: ctx.num_patches(),
        });
    }

    for (patch_id, mirror) in host.patches.iter_mut().enumerate() {
        mirror.pull_from(ctx.patch(patch_id as u32));
    }

    let mut safety_net: Option<MeshError> = None;
    for kind in ElementKind::ALL {
        let slot = HostMirror::kind_index(kind);
        let mut running = 0u32;
        for (patch_id, mirror) in host.patches.iter().enumerate() {
            let owned = mirror.element(kind).live_owned_count();
            host.owned_counts[slot][patch_id] = owned;
            host.prefix_sums[slot][patch_id] = running;
            running += owned;
        }
        let n = host.patches.len();
        host.prefix_sums[slot][n] = running;

        let expected = ctx.num_elements(kind);
        if running != expected {
            log::error!(
                "[Reconcile] {:?} prefix-sum total {} does not match global count {}",
                kind,
                running,
                expected
            );
            safety_net.get_or_insert(MeshError::PrefixSumMismatch {
                kind,
                computed: running,
                expected,
            });
        }
    }

    // Push refreshed counts back to the device-resident summary arrays
    // so later kernel launches see updated bounds.
    ctx.refresh_summaries();
    log::debug!("[Reconcile] host mirrors updated for {} patches", host.num_patches());

    match safety_net {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
