//! Morton-sorted spatial locality links (spec §4.5 "Locality-link
//! construction").
//!
//! Proposes soft neighbor relations between triangles in different *small*
//! islands (< 128 triangles) that are close in space but not connected by
//! mesh topology — links the graph bisector can use as a tie-breaker so a
//! thin sliver of an island doesn't get split across a cluster boundary.

use crate::config::{ClusterConfig, LOCALITY_ISLAND_THRESHOLD, LOCALITY_SCAN_RADIUS, MAX_LOCALITY_LINKS, TRIANGLE_BATCH_SIZE};
use crate::disjoint_set::DisjointSet;
use crate::geometry::{Bounds3, Vec3};
use crate::morton::morton_code;
use crate::parallel::{parallel_for, ScatterSlice};
use crate::radix_sort::sort_by_key;
use std::collections::HashMap;

/// Inclusive range `[begin, end]` of sorted positions sharing an island root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub begin: u32,
    pub end: u32,
}

/// Result of the locality pass: the Morton-sorted triangle order plus the
/// symmetric locality multimap keyed by triangle index.
pub struct LocalityLinks {
    /// `indices[i]` = triangle index at sorted position `i`.
    pub indices: Vec<u32>,
    /// `sorted_to[t]` = sorted position of triangle `t` (inverse permutation).
    pub sorted_to: Vec<u32>,
    links: HashMap<u32, Vec<u32>>,
}

impl LocalityLinks {
    pub fn neighbors(&self, t: u32) -> &[u32] {
        self.links.get(&t).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Builds Morton order, island ranges, and the locality multimap for
/// `num_triangles` triangles. `disjoint_set` must already reflect the final
/// topology (spec §4.6 step 5 has completed). `group_of` returns a material
/// group id per triangle, or is ignored entirely when groups are disabled.
pub fn build_locality_links(
    num_triangles: u32,
    disjoint_set: &mut DisjointSet,
    bounds: &Bounds3,
    group_of: Option<&[i32]>,
    get_center: impl Fn(u32) -> Vec3 + Sync,
    _config: &ClusterConfig,
) -> LocalityLinks {
    let n = num_triangles as usize;
    if n == 0 {
        return LocalityLinks {
            indices: Vec::new(),
            sorted_to: Vec::new(),
            links: HashMap::new(),
        };
    }

    let sort_keys = ScatterSlice::new(n, 0u32);
    parallel_for("BuildLocalityLinks.morton", n, TRIANGLE_BATCH_SIZE, |i| {
        let center = get_center(i);
        sort_keys.set(i as usize, morton_code(center, bounds));
    });
    let sort_keys = sort_keys.into_vec();

    let unsorted: Vec<u32> = (0..num_triangles).collect();
    let indices = sort_by_key(&unsorted, |t| sort_keys[t as usize]);

    let mut sorted_to = vec![0u32; n];
    for (i, &t) in indices.iter().enumerate() {
        sorted_to[t as usize] = i as u32;
    }

    let island_ranges = compute_island_ranges(&indices, disjoint_set);

    let mut links: HashMap<u32, Vec<u32>> = HashMap::new();
    let enable_groups = group_of.is_some();

    for i in 0..n {
        let range = island_ranges[i];
        let range_size = range.end - range.begin + 1;
        if range_size >= LOCALITY_ISLAND_THRESHOLD {
            continue;
        }

        let index = indices[i];
        let island_id = disjoint_set.parent_of(index);
        let group_id = group_of.map(|g| g[index as usize]).unwrap_or(0);
        let center = get_center(index);

        let mut closest: Vec<(u32, f32)> = Vec::with_capacity(MAX_LOCALITY_LINKS);

        for direction in 0..2 {
            let forward = direction == 1;
            let limit: i64 = if forward { n as i64 - 1 } else { 0 };
            let step: i64 = if forward { 1 } else { -1 };

            let mut adj = i as i64;
            for _ in 0..LOCALITY_SCAN_RADIUS {
                if adj == limit {
                    break;
                }
                adj += step;

                let adj_index = indices[adj as usize];
                let adj_island_id = disjoint_set.parent_of(adj_index);
                let adj_group_id = if enable_groups {
                    group_of.unwrap()[adj_index as usize]
                } else {
                    0
                };

                if island_id == adj_island_id || group_id != adj_group_id {
                    // Reject: skip past the entire island range of the
                    // candidate rather than stepping one triangle at a time.
                    let adj_range = island_ranges[adj as usize];
                    adj = if forward { adj_range.end as i64 } else { adj_range.begin as i64 };
                    continue;
                }

                let dist2 = center.distance_squared(get_center(adj_index));
                insert_closest(&mut closest, adj_index, dist2);
            }
        }

        for &(candidate, _) in &closest {
            links.entry(index).or_default().push(candidate);
            links.entry(candidate).or_default().push(index);
        }
    }

    LocalityLinks { indices, sorted_to, links }
}

/// Maintains a bounded, distance-sorted list of up to [`MAX_LOCALITY_LINKS`]
/// closest candidates (insertion sort; the list never grows past the cap).
fn insert_closest(closest: &mut Vec<(u32, f32)>, candidate: u32, dist2: f32) {
    let pos = closest.partition_point(|&(_, d)| d <= dist2);
    if pos >= MAX_LOCALITY_LINKS {
        return;
    }
    if closest.len() >= MAX_LOCALITY_LINKS {
        closest.pop();
    }
    closest.insert(pos, (candidate, dist2));
}

/// One linear pass over the Morton-sorted order, grouping consecutive
/// entries sharing an island root into inclusive `[begin, end]` ranges
/// (spec §4.5 step 4).
fn compute_island_ranges(indices: &[u32], disjoint_set: &mut DisjointSet) -> Vec<Range> {
    let n = indices.len();
    let mut ranges = vec![Range { begin: 0, end: 0 }; n];
    if n == 0 {
        return ranges;
    }

    let mut curr_root = disjoint_set.find(indices[0]);
    let mut range_begin = 0u32;

    for i in 0..n {
        let root = disjoint_set.find(indices[i]);
        if root != curr_root {
            for j in range_begin as usize..i {
                ranges[j].end = i as u32 - 1;
            }
            curr_root = root;
            range_begin = i as u32;
        }
        ranges[i].begin = range_begin;
    }

    for j in range_begin as usize..n {
        ranges[j].end = n as u32 - 1;
    }

    ranges
}
