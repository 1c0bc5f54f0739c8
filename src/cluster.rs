//! Output cluster representation (spec §6 "Output contract").
//!
//! A `Cluster` carries only what the spec's output contract names: permuted
//! triangle indices, per-triangle material ids, a bounding box, a unique id
//! and a mip level. It does not carry vertex attribute data (positions,
//! normals, UVs) — that remains the caller's `StridedView`-equivalent,
//! addressed through the permuted indices this crate emits (see DESIGN.md).

use crate::geometry::Bounds3;
use std::sync::atomic::{AtomicU64, Ordering};

/// One output cluster: a contiguous slice of the permuted triangle order,
/// plus the bookkeeping downstream LOD construction needs.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Global triangle ids, in cluster-local order, `3 * triangle_count()` long when expanded to indices.
    pub triangles: Vec<u32>,
    /// Material id per triangle in `triangles`, parallel to it. Empty when
    /// materials were not supplied.
    pub material_ids: Vec<i32>,
    pub bounds: Bounds3,
    /// Globally unique 64-bit id (spec §6 "GUID"), allocated from a
    /// process-wide counter so distinct clustering passes never collide.
    pub id: u64,
    /// 0 at this stage; populated by the downstream hierarchy builder.
    pub mip_level: u32,
}

static NEXT_CLUSTER_ID: AtomicU64 = AtomicU64::new(1);

impl Cluster {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Allocates the next globally unique cluster id. Monotonic for the
    /// lifetime of the process; never reused, even across separate calls to
    /// [`crate::orchestrator::cluster_triangles`].
    pub fn next_id() -> u64 {
        NEXT_CLUSTER_ID.fetch_add(1, Ordering::Relaxed)
    }
}
