//! `ClusterTriangles`: the top-level orchestrator (spec §4.6, component C6).
//!
//! Wires every other component together for one clustering pass: edge
//! matching, adjacency collapse into islands, locality-augmented graph
//! build, and recursive bisection into output clusters.

use crate::adjacency::{Adjacency, COMPLEX};
use crate::cluster::Cluster;
use crate::contract::ClusterFault;
use crate::config::{ClusterConfig, ADJACENCY_WEIGHT, EDGE_BATCH_SIZE, LOCALITY_WEIGHT, PARALLEL_BISECT_THRESHOLD};
use crate::disjoint_set::DisjointSet;
use crate::edge_hash::EdgeHash;
use crate::geometry::{Bounds3, Vec3};
use crate::parallel::{parallel_for, ScatterSlice};
use crate::partition::{build_locality_links, GraphBisector, GraphBuilder, GreedyGraphGrowing, Partition};

/// Borrowed view over the input mesh (spec §6 "Input contract"). Mesh I/O
/// and vertex welding are the caller's responsibility.
pub struct MeshView<'a> {
    pub positions: &'a [Vec3],
    /// Triangle index stream, length divisible by 3, each entry `< positions.len()`.
    pub indices: &'a [u32],
    /// Per-triangle material id, length `indices.len() / 3`, or empty to
    /// disable material-aware locality filtering.
    pub material_indexes: &'a [i32],
    pub bounds: Bounds3,
}

impl<'a> MeshView<'a> {
    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    fn position(&self, half_edge: u32) -> Vec3 {
        self.positions[self.indices[half_edge as usize] as usize]
    }

    fn triangle_center(&self, t: u32) -> Vec3 {
        let e = t * 3;
        let sum = self.position(e) + self.position(e + 1) + self.position(e + 2);
        sum * (1.0 / 3.0)
    }

    fn triangle_bounds(&self, t: u32) -> Bounds3 {
        let e = t * 3;
        Bounds3::from_points([self.position(e), self.position(e + 1), self.position(e + 2)])
    }
}

/// Runs the full pipeline over `mesh` and returns the resulting clusters.
/// Uses the default greedy-graph-growing bisector; see [`cluster_triangles_with`]
/// to supply a different [`GraphBisector`].
///
/// Malformed input (an index stream not divisible by 3, an out-of-range
/// vertex index, or a `material_indexes` length that doesn't match the
/// triangle count) is the one condition in this crate that's the caller's
/// mistake rather than a broken internal invariant, so it's reported as an
/// `Err` instead of a contract-violation panic.
pub fn cluster_triangles(mesh: &MeshView, config: &ClusterConfig) -> Result<Vec<Cluster>, ClusterFault> {
    cluster_triangles_with(mesh, config, &GreedyGraphGrowing)
}

pub fn cluster_triangles_with(mesh: &MeshView, config: &ClusterConfig, bisector: &dyn GraphBisector) -> Result<Vec<Cluster>, ClusterFault> {
    validate_mesh(mesh)?;

    let triangle_count = mesh.triangle_count();
    if triangle_count == 0 {
        return Ok(Vec::new());
    }
    let num_half_edges = (triangle_count * 3) as usize;

    let edge_hash = EdgeHash::new(num_half_edges);

    // Step 2: parallel insertion.
    parallel_for("ClusterTriangles.edge_hash_insert", num_half_edges, EDGE_BATCH_SIZE, |e| {
        edge_hash.add_concurrent(e, |he| mesh.position(he));
    });

    // Step 3: parallel match-count pass, writing `direct[e]` directly.
    let direct = ScatterSlice::new(num_half_edges, crate::adjacency::UNLINKED);
    parallel_for("ClusterTriangles.match_count", num_half_edges, EDGE_BATCH_SIZE, |e| {
        let mut found = crate::adjacency::UNLINKED;
        let mut count = 0u32;
        edge_hash.for_all_matching_readonly(e, |he| mesh.position(he), |_, other| {
            count += 1;
            found = other as i32;
        });
        direct.set(e as usize, if count == 1 { found } else if count == 0 { crate::adjacency::UNLINKED } else { COMPLEX });
    });
    let mut adjacency = Adjacency::from_direct(direct.into_vec());

    let mut disjoint_set = DisjointSet::new(triangle_count);

    // Step 5: strictly ascending serial pass — `UnionSequential`'s precondition depends on it.
    for e in 0..num_half_edges as u32 {
        if adjacency.direct[e as usize] == COMPLEX {
            let mut matches: Vec<(u32, u32)> = Vec::new();
            edge_hash.for_all_matching_readonly(e, |he| mesh.position(he), |a, b| matches.push((a, b)));
            matches.sort_unstable();
            for (a, b) in matches {
                adjacency.link(a as i32, b as i32);
            }
        }

        let mut unions: Vec<(u32, u32)> = Vec::new();
        adjacency.for_all(e as i32, |cur, other| {
            if cur > other {
                unions.push((cur as u32 / 3, other as u32 / 3));
            }
        });
        for (tri, other_tri) in unions {
            disjoint_set.union_sequential(tri, other_tri);
        }
    }

    // Step 6: locality links + graph build + bisection.
    let group_of: Option<&[i32]> = if mesh.material_indexes.is_empty() { None } else { Some(mesh.material_indexes) };

    let locality = build_locality_links(
        triangle_count,
        &mut disjoint_set,
        &mesh.bounds,
        group_of,
        |t| mesh.triangle_center(t),
        config,
    );

    let mut builder = GraphBuilder::with_capacity(triangle_count as usize, triangle_count as usize * 4);
    build_graph(&mut builder, &adjacency, &locality, triangle_count);
    let graph = builder.finish();

    let enable_threaded = triangle_count as usize >= PARALLEL_BISECT_THRESHOLD;
    let (order, ranges) = Partition::strict(triangle_count, &graph, config, bisector, enable_threaded);

    let mut clusters = Vec::with_capacity(ranges.len());
    for range in ranges.iter() {
        let sorted_positions = &order[range.begin as usize..range.end as usize];
        let triangles: Vec<u32> = sorted_positions.iter().map(|&p| locality.indices[p as usize]).collect();
        let material_ids: Vec<i32> = group_of.map(|g| triangles.iter().map(|&t| g[t as usize]).collect()).unwrap_or_default();
        let bounds = triangles.iter().fold(Bounds3::empty(), |mut b, &t| {
            let tb = mesh.triangle_bounds(t);
            b.grow(tb.min);
            b.grow(tb.max);
            b
        });

        clusters.push(Cluster {
            triangles,
            material_ids,
            bounds,
            id: Cluster::next_id(),
            mip_level: 0,
        });
    }

    Ok(clusters)
}

fn validate_mesh(mesh: &MeshView) -> Result<(), ClusterFault> {
    fn err(message: impl Into<String>) -> ClusterFault {
        ClusterFault::new("mesh input is well-formed", file!(), line!(), Some(message.into()))
    }

    if mesh.indices.len() % 3 != 0 {
        return Err(err(format!("index stream length {} is not divisible by 3", mesh.indices.len())));
    }
    let triangle_count = mesh.indices.len() / 3;
    if !mesh.material_indexes.is_empty() && mesh.material_indexes.len() != triangle_count {
        return Err(err(format!(
            "material_indexes length {} does not match triangle count {}",
            mesh.material_indexes.len(),
            triangle_count
        )));
    }
    if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= mesh.positions.len()) {
        return Err(err(format!("vertex index {bad} is out of range for {} positions", mesh.positions.len())));
    }
    Ok(())
}

/// Builds the CSR graph over the Morton-sorted vertex order (spec §4.5
/// "Graph build"): adjacency edges at weight 260, locality edges at weight 1.
/// Done serially since `GraphBuilder` threads a running offset across
/// vertices and the caller needs deterministic adjacency-list order per
/// vertex for reproducible bisection (spec property 3).
fn build_graph(builder: &mut GraphBuilder, adjacency: &Adjacency, locality: &crate::partition::LocalityLinks, triangle_count: u32) {
    for i in 0..triangle_count {
        let t = locality.indices[i as usize];
        builder.begin_vertex();
        for half_edge in t * 3..t * 3 + 3 {
            adjacency.for_all(half_edge as i32, |_, other| {
                let other_tri = other as u32 / 3;
                let other_sorted = locality.sorted_to[other_tri as usize];
                builder.add_edge(other_sorted, ADJACENCY_WEIGHT);
            });
        }
        for &neighbor in locality.neighbors(t) {
            let neighbor_sorted = locality.sorted_to[neighbor as usize];
            builder.add_edge(neighbor_sorted, LOCALITY_WEIGHT);
        }
    }
}
