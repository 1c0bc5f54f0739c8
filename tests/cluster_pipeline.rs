//! End-to-end integration tests over the public `cluster_triangles` entry
//! point: totality, size bounds, and determinism properties that only show
//! up once every component is wired together.

use cluster_builder::config::ClusterConfig;
use cluster_builder::geometry::{Bounds3, Vec3};
use cluster_builder::{cluster_triangles, MeshView};

/// Builds `count` disconnected unit quads (2 triangles each) spaced 2 units
/// apart along x, so their Morton order matches build order and each quad
/// is its own island, well under the locality-link island threshold.
fn quad_strip(count: u32) -> (Vec<Vec3>, Vec<u32>) {
    let mut positions = Vec::with_capacity(count as usize * 4);
    let mut indices = Vec::with_capacity(count as usize * 6);
    for i in 0..count {
        let ox = i as f32 * 2.0;
        let base = positions.len() as u32;
        positions.push(Vec3::new(ox, 0.0, 0.0));
        positions.push(Vec3::new(ox + 1.0, 0.0, 0.0));
        positions.push(Vec3::new(ox, 1.0, 0.0));
        positions.push(Vec3::new(ox + 1.0, 1.0, 0.0));
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
    }
    (positions, indices)
}

// S5: a 128x2 grid of triangles (256 total) should split into exactly two
// clusters, each within [Smin, Smax], covering every triangle exactly once.
#[test]
fn grid_of_256_triangles_splits_into_two_bounded_clusters() {
    let (positions, indices) = quad_strip(128);
    let bounds = Bounds3::from_points(positions.iter().copied());
    let mesh = MeshView {
        positions: &positions,
        indices: &indices,
        material_indexes: &[],
        bounds,
    };
    let config = ClusterConfig::default();

    let clusters = cluster_triangles(&mesh, &config).unwrap();

    assert_eq!(clusters.len(), 2);
    for cluster in &clusters {
        assert!(cluster.triangle_count() >= config.min_partition_size as usize);
        assert!(cluster.triangle_count() <= config.max_partition_size as usize);
    }

    let mut all: Vec<u32> = clusters.iter().flat_map(|c| c.triangles.iter().copied()).collect();
    all.sort_unstable();
    let expected: Vec<u32> = (0..256).collect();
    assert_eq!(all, expected);
}

// Totality + size-bound properties over a larger, non-power-of-two input,
// checked with the default bisector (no custom GraphBisector supplied).
#[test]
fn totality_and_size_bounds_hold_over_many_islands() {
    let (positions, indices) = quad_strip(101);
    let bounds = Bounds3::from_points(positions.iter().copied());
    let mesh = MeshView {
        positions: &positions,
        indices: &indices,
        material_indexes: &[],
        bounds,
    };
    let config = ClusterConfig::default();

    let clusters = cluster_triangles(&mesh, &config).unwrap();
    let total_triangles = 101 * 2;

    let mut all: Vec<u32> = clusters.iter().flat_map(|c| c.triangles.iter().copied()).collect();
    all.sort_unstable();
    let expected: Vec<u32> = (0..total_triangles).collect();
    assert_eq!(all, expected);

    for cluster in &clusters {
        let count = cluster.triangle_count() as u32;
        assert!(count >= config.min_partition_size, "cluster under Smin: {count}");
        assert!(count <= config.max_partition_size, "cluster over Smax: {count}");
    }
}

// 190 quads (380 triangles) lands in the band that a blind halve-in-two
// bisector gets wrong: 190/190 then 95/95 leaves four undersized clusters
// even though a 127/127/126 three-way split satisfies Smin/Smax. Recursive
// bisection must steer toward the proportional leaf count instead.
#[test]
fn unevenly_divisible_input_still_meets_size_bounds() {
    let (positions, indices) = quad_strip(190);
    let bounds = Bounds3::from_points(positions.iter().copied());
    let mesh = MeshView {
        positions: &positions,
        indices: &indices,
        material_indexes: &[],
        bounds,
    };
    let config = ClusterConfig::default();

    let clusters = cluster_triangles(&mesh, &config).unwrap();

    let mut all: Vec<u32> = clusters.iter().flat_map(|c| c.triangles.iter().copied()).collect();
    all.sort_unstable();
    let expected: Vec<u32> = (0..380).collect();
    assert_eq!(all, expected);

    for cluster in &clusters {
        let count = cluster.triangle_count() as u32;
        assert!(count >= config.min_partition_size, "cluster under Smin: {count}");
        assert!(count <= config.max_partition_size, "cluster over Smax: {count}");
    }
}

// Determinism: the same mesh clustered twice yields identical cluster
// triangle membership (spec property 3 "reproducibility").
#[test]
fn clustering_is_deterministic_across_runs() {
    let (positions, indices) = quad_strip(64);
    let bounds = Bounds3::from_points(positions.iter().copied());
    let mesh = MeshView {
        positions: &positions,
        indices: &indices,
        material_indexes: &[],
        bounds,
    };
    let config = ClusterConfig::default();

    let first = cluster_triangles(&mesh, &config).unwrap();
    let second = cluster_triangles(&mesh, &config).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.triangles, b.triangles);
    }
}

// Materials: per-triangle material ids survive the permutation into clusters.
#[test]
fn material_ids_follow_their_triangles_through_clustering() {
    let (positions, indices) = quad_strip(4);
    let bounds = Bounds3::from_points(positions.iter().copied());
    // alternate material id per quad.
    let material_indexes: Vec<i32> = (0..8).map(|t| (t / 2) % 2).collect();
    let mesh = MeshView {
        positions: &positions,
        indices: &indices,
        material_indexes: &material_indexes,
        bounds,
    };
    let config = ClusterConfig::default();

    let clusters = cluster_triangles(&mesh, &config).unwrap();
    for cluster in &clusters {
        assert_eq!(cluster.material_ids.len(), cluster.triangles.len());
        for (&t, &m) in cluster.triangles.iter().zip(cluster.material_ids.iter()) {
            assert_eq!(m, material_indexes[t as usize]);
        }
    }
}
