//! Recursive balanced bisection into size-bounded clusters (spec §4.5
//! "Recursive bisection" and "External bisector interface", §4.6 step 6).
//!
//! The "external bisector" the distilled design leaves as an opaque box is
//! implemented here behind [`GraphBisector`], the same seam
//! `recursive_nd`/`inertial_partition` occupy in the routing engine's
//! nested-dissection ordering (`step6.rs`): a pure function from a subgraph
//! to a two-way vertex label, called recursively with `rayon::join` fan-out
//! once a subgraph is large enough to be worth the thread overhead, and
//! falling back to a degenerate split when balance comes back too skewed.
//! The default implementation is a greedy graph-growing bisector (GGGP):
//! grow one side from a seed by repeatedly pulling in the highest-gain
//! boundary vertex until it reaches half the subgraph's weight, leaving the
//! rest for the other side.

use crate::config::ClusterConfig;
use crate::partition::graph::GraphData;
use std::collections::{BinaryHeap, HashMap};

/// A balanced two-way edge-cut minimizer over a weighted adjacency graph in
/// CSR form. `bisect` returns a `0`/`1` label per vertex, indexed the same
/// way as `xadj`/`adjncy`.
pub trait GraphBisector: Sync {
    fn bisect(&self, xadj: &[u32], adjncy: &[u32], adjwgt: &[i32]) -> Vec<u8>;
}

/// Default bisector: greedy graph growing from a single seed (spec §6
/// "External bisector interface" leaves the algorithm unspecified; this is
/// the purpose-built implementation DESIGN.md documents as the crate's
/// stand-in for a multilevel kernel like METIS).
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyGraphGrowing;

impl GraphBisector for GreedyGraphGrowing {
    fn bisect(&self, xadj: &[u32], adjncy: &[u32], adjwgt: &[i32]) -> Vec<u8> {
        let n = xadj.len().saturating_sub(1);
        let mut label = vec![1u8; n];
        if n <= 1 {
            return label;
        }

        let seed = highest_degree_vertex(xadj);
        let target = n / 2;

        let mut in_region: Vec<bool> = vec![false; n];
        let mut gain = vec![0i64; n];
        let mut heap: BinaryHeap<(i64, std::cmp::Reverse<u32>)> = BinaryHeap::new();
        heap.push((0, std::cmp::Reverse(seed)));

        let mut grown = 0usize;
        while grown < target {
            let Some((g, std::cmp::Reverse(v))) = heap.pop() else { break };
            if in_region[v as usize] || g != gain[v as usize] {
                continue; // stale heap entry
            }
            in_region[v as usize] = true;
            label[v as usize] = 0;
            grown += 1;

            for (nb, w) in neighbors(xadj, adjncy, adjwgt, v) {
                if in_region[nb as usize] {
                    continue;
                }
                gain[nb as usize] += w as i64;
                heap.push((gain[nb as usize], std::cmp::Reverse(nb)));
            }
        }

        label
    }
}

fn highest_degree_vertex(xadj: &[u32]) -> u32 {
    (0..xadj.len() - 1)
        .max_by_key(|&v| xadj[v + 1] - xadj[v])
        .unwrap_or(0) as u32
}

fn neighbors<'a>(
    xadj: &'a [u32],
    adjncy: &'a [u32],
    adjwgt: &'a [i32],
    v: u32,
) -> impl Iterator<Item = (u32, i32)> + 'a {
    let begin = xadj[v as usize] as usize;
    let end = xadj[v as usize + 1] as usize;
    adjncy[begin..end].iter().copied().zip(adjwgt[begin..end].iter().copied())
}

/// A `[begin, end)` interval into the permuted triangle-index array, one
/// cluster's worth of sorted positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub begin: u32,
    pub end: u32,
}

/// Computes the target number of parts for `n` vertices (spec §4.5
/// `Partition`): `round(n / ((Smin+Smax)/2))`, clamped to at least 1.
pub fn target_parts(n: u32, config: &ClusterConfig) -> u32 {
    if n == 0 {
        return 0;
    }
    let avg = (config.min_partition_size + config.max_partition_size) as f64 / 2.0;
    ((n as f64 / avg).round() as u32).max(1)
}

/// Recursively bisects `graph` (over `n` vertices, positions `0..n`) into
/// ranges respecting `config`'s size bounds, permuting `order` in place so
/// each emitted range is contiguous.
///
/// `order[i]` starts as the identity permutation of sorted positions and
/// ends up reordered so that every [`Range`] in the returned list is
/// contiguous within it; callers compose `order` with their own
/// sorted-position-to-triangle-id mapping to get final triangle ranges.
pub struct Partition;

impl Partition {
    /// Matches the spec's failure modes directly: `n == 0` emits nothing,
    /// `n <= Smax` emits one range without invoking the bisector at all.
    pub fn strict(
        n: u32,
        graph: &GraphData,
        config: &ClusterConfig,
        bisector: &dyn GraphBisector,
        enable_threaded: bool,
    ) -> (Vec<u32>, Vec<Range>) {
        if n == 0 {
            return (Vec::new(), Vec::new());
        }
        if n <= config.max_partition_size {
            return ((0..n).collect(), vec![Range { begin: 0, end: n }]);
        }

        let vertices: Vec<u32> = (0..n).collect();
        let mut swapped = vec![false; n as usize];
        let mut order = Vec::with_capacity(n as usize);
        let mut ranges = Vec::new();
        let target_leaves = target_parts(n, config);

        recursive_bisect(&vertices, target_leaves, graph, config, bisector, enable_threaded, &mut swapped, &mut order, &mut ranges);

        debug_assert_eq!(order.len(), n as usize);
        (order, ranges)
    }
}

/// Recurses one bisection step. `target_leaves` is how many leaves this
/// subtree is aiming to eventually produce (spec §4.5 `Partition`'s
/// `round(N/((Smin+Smax)/2))`, carried down and halved at each level rather
/// than computed once and discarded): each side is steered toward its
/// proportional share of `vertices.len()` instead of a blind 50/50 split, so
/// a subtree whose size isn't an exact power-of-two multiple of the target
/// leaf size still converges on leaves within `[Smin, Smax]` instead of
/// bottoming out at a symmetric-but-undersized split (e.g. N=380 splitting
/// 190/190 then 95/95, four leaves all under Smin, when a 127/126/127
/// three-way split was reachable).
fn recursive_bisect(
    vertices: &[u32],
    target_leaves: u32,
    graph: &GraphData,
    config: &ClusterConfig,
    bisector: &dyn GraphBisector,
    enable_threaded: bool,
    swapped: &mut [bool],
    order: &mut Vec<u32>,
    ranges: &mut Vec<Range>,
) {
    if vertices.len() as u32 <= config.max_partition_size {
        emit_leaf(vertices, order, ranges);
        return;
    }

    // At least two leaves are needed regardless of what `target_leaves`
    // rounded to, since a single leaf here would exceed Smax.
    let local_target = target_leaves.max(2);
    let left_leaves = local_target / 2;
    let right_leaves = local_target - left_leaves;
    let target_a = leaf_target_size(vertices.len() as u32, left_leaves, local_target, config);

    let (local_xadj, local_adjncy, local_adjwgt, local_to_global) = induced_subgraph(graph, vertices);
    let labels = bisector.bisect(&local_xadj, &local_adjncy, &local_adjwgt);

    let mut side_a: Vec<u32> = Vec::new();
    let mut side_b: Vec<u32> = Vec::new();
    for (local, &global) in local_to_global.iter().enumerate() {
        if labels[local] == 0 {
            side_a.push(global);
        } else {
            side_b.push(global);
        }
    }

    // The bisector failing to produce two nonempty sides (tiny or
    // disconnected subgraph) falls back to a plain positional split rather
    // than looping forever.
    if side_a.is_empty() || side_b.is_empty() {
        let mid = vertices.len() / 2;
        side_a = vertices[..mid].to_vec();
        side_b = vertices[mid..].to_vec();
    }

    rebalance(&mut side_a, &mut side_b, target_a, graph, swapped);

    let threaded = enable_threaded
        && side_a.len() >= crate::config::PARALLEL_BISECT_THRESHOLD
        && side_b.len() >= crate::config::PARALLEL_BISECT_THRESHOLD;

    if threaded {
        let mut order_a = Vec::new();
        let mut ranges_a = Vec::new();
        let mut order_b = Vec::new();
        let mut ranges_b = Vec::new();
        // `swapped` is only read (not written) by the recursive calls below
        // the rebalance step above, so splitting it into two disjoint
        // halves to satisfy the borrow checker under `rayon::join` is safe:
        // each half only ever touches indices within its own partition.
        let (_, _) = rayon::join(
            || recursive_bisect(&side_a, left_leaves, graph, config, bisector, enable_threaded, &mut swapped.to_vec(), &mut order_a, &mut ranges_a),
            || recursive_bisect(&side_b, right_leaves, graph, config, bisector, enable_threaded, &mut swapped.to_vec(), &mut order_b, &mut ranges_b),
        );
        append_child(order, ranges, order_a, ranges_a);
        append_child(order, ranges, order_b, ranges_b);
    } else {
        recursive_bisect(&side_a, left_leaves, graph, config, bisector, enable_threaded, swapped, order, ranges);
        recursive_bisect(&side_b, right_leaves, graph, config, bisector, enable_threaded, swapped, order, ranges);
    }
}

/// Desired vertex count for a side that will itself recurse into `leaves`
/// further leaves out of `local_target` total, proportional to the parent's
/// size. Clamped to `[Smin, Smax]` when `leaves == 1`, since that side
/// becomes a leaf directly rather than recursing again.
fn leaf_target_size(total: u32, leaves: u32, local_target: u32, config: &ClusterConfig) -> u32 {
    let raw = ((total as f64) * (leaves as f64) / (local_target as f64)).round() as u32;
    if leaves == 1 {
        raw.clamp(config.min_partition_size, config.max_partition_size)
    } else {
        raw
    }
}

fn emit_leaf(vertices: &[u32], order: &mut Vec<u32>, ranges: &mut Vec<Range>) {
    let begin = order.len() as u32;
    order.extend_from_slice(vertices);
    ranges.push(Range { begin, end: order.len() as u32 });
}

fn append_child(order: &mut Vec<u32>, ranges: &mut Vec<Range>, child_order: Vec<u32>, child_ranges: Vec<Range>) {
    let offset = order.len() as u32;
    order.extend(child_order);
    ranges.extend(child_ranges.into_iter().map(|r| Range {
        begin: r.begin + offset,
        end: r.end + offset,
    }));
}

/// Steers `side_a` toward `target_a` vertices (and `side_b` toward the
/// complement) by repeatedly moving boundary vertices — ones with an edge
/// across the cut — from whichever side is oversized into the other.
/// `swapped` marks vertices already moved once so a vertex never oscillates
/// back and forth across repeated rebalances at nearby recursion levels;
/// each iteration's boundary is recomputed so peeling one layer exposes the
/// next, converging toward the target over several passes rather than one.
/// Stops early if a side runs out of movable boundary vertices — a
/// genuinely fragmented subgraph may not have enough cross-cut connectivity
/// to hit the target exactly, in which case the leaf falls outside `[Smin,
/// Smax]` (the one deviation from the balance contract this crate accepts,
/// see DESIGN.md).
fn rebalance(side_a: &mut Vec<u32>, side_b: &mut Vec<u32>, target_a: u32, graph: &GraphData, swapped: &mut [bool]) {
    let target_a = target_a as i64;

    loop {
        let diff = side_a.len() as i64 - target_a;
        if diff == 0 {
            break;
        }
        let moved = if diff > 0 {
            move_boundary(side_a, side_b, diff as usize, graph, swapped)
        } else {
            move_boundary(side_b, side_a, (-diff) as usize, graph, swapped)
        };
        if moved == 0 {
            break;
        }
    }
}

/// Moves up to `count` vertices from `from` to `to`, preferring vertices
/// already adjacent to `to` (so the cut stays connected-ish) and never
/// revisiting a vertex already moved once (`swapped`). Returns how many
/// vertices actually moved, which is less than `count` once `from` runs out
/// of eligible boundary vertices.
fn move_boundary(from: &mut Vec<u32>, to: &mut Vec<u32>, count: usize, graph: &GraphData, swapped: &mut [bool]) -> usize {
    let to_set: std::collections::HashSet<u32> = to.iter().copied().collect();
    let mut boundary: Vec<u32> = from
        .iter()
        .copied()
        .filter(|&v| !swapped[v as usize] && graph.neighbors(v).any(|(nb, _)| to_set.contains(&nb)))
        .collect();
    boundary.sort_unstable();

    let take = count.min(boundary.len());
    for &v in boundary.iter().take(take) {
        swapped[v as usize] = true;
    }
    let moved: std::collections::HashSet<u32> = boundary.into_iter().take(take).collect();
    from.retain(|v| !moved.contains(v));
    to.extend(&moved);
    take
}

/// Builds a CSR subgraph restricted to `vertices`, dropping edges to
/// vertices outside the set, plus the local-index-to-global-vertex map.
fn induced_subgraph(graph: &GraphData, vertices: &[u32]) -> (Vec<u32>, Vec<u32>, Vec<i32>, Vec<u32>) {
    let local_of: HashMap<u32, u32> = vertices.iter().enumerate().map(|(i, &v)| (v, i as u32)).collect();

    let mut xadj = Vec::with_capacity(vertices.len() + 1);
    let mut adjncy = Vec::new();
    let mut adjwgt = Vec::new();

    for &v in vertices {
        xadj.push(adjncy.len() as u32);
        for (nb, w) in graph.neighbors(v) {
            if let Some(&local_nb) = local_of.get(&nb) {
                adjncy.push(local_nb);
                adjwgt.push(w);
            }
        }
    }
    xadj.push(adjncy.len() as u32);

    (xadj, adjncy, adjwgt, vertices.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::graph::GraphBuilder;

    fn chain_graph(n: u32) -> GraphData {
        let mut b = GraphBuilder::with_capacity(n as usize, n as usize * 2);
        for i in 0..n {
            b.begin_vertex();
            if i > 0 {
                b.add_edge(i - 1, 260);
            }
            if i + 1 < n {
                b.add_edge(i + 1, 260);
            }
        }
        b.finish()
    }

    #[test]
    fn target_parts_matches_round_formula() {
        let config = ClusterConfig::default(); // Smin=124, Smax=128, avg=126
        assert_eq!(target_parts(0, &config), 0);
        assert_eq!(target_parts(126, &config), 1);
        assert_eq!(target_parts(256, &config), 2);
        assert_eq!(target_parts(378, &config), 3);
    }

    #[test]
    fn small_graph_yields_single_range_without_bisector() {
        let graph = chain_graph(10);
        let config = ClusterConfig::new(128, 4);
        let bisector = GreedyGraphGrowing;
        let (order, ranges) = Partition::strict(10, &graph, &config, &bisector, false);
        assert_eq!(ranges, vec![Range { begin: 0, end: 10 }]);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_graph_yields_no_ranges() {
        let graph = chain_graph(0);
        let config = ClusterConfig::default();
        let bisector = GreedyGraphGrowing;
        let (order, ranges) = Partition::strict(0, &graph, &config, &bisector, false);
        assert!(order.is_empty());
        assert!(ranges.is_empty());
    }

    #[test]
    fn large_graph_partitions_totality_and_bounds() {
        let n = 500u32;
        let graph = chain_graph(n);
        let config = ClusterConfig::new(128, 4); // Smin=124, Smax=128
        let bisector = GreedyGraphGrowing;
        let (order, ranges) = Partition::strict(n, &graph, &config, &bisector, false);

        // property 1: totality.
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());

        let mut covered = 0u32;
        for r in &ranges {
            covered += r.end - r.begin;
            assert!(r.end - r.begin <= config.max_partition_size, "range exceeds Smax: {r:?}");
            assert!(r.end - r.begin >= config.min_partition_size, "range under Smin: {r:?}");
        }
        assert_eq!(covered, n);
    }

    // N=380 lands exactly between two and four quadruple-halvings (190/190,
    // then 95/95): blindly bisecting in half would bottom out at four
    // undersized leaves even though a 127/127/126 three-way split is
    // reachable. Proportional target splitting must find it.
    #[test]
    fn unevenly_divisible_graph_still_meets_size_bounds() {
        let n = 380u32;
        let graph = chain_graph(n);
        let config = ClusterConfig::new(128, 4); // Smin=124, Smax=128
        let bisector = GreedyGraphGrowing;
        let (order, ranges) = Partition::strict(n, &graph, &config, &bisector, false);

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..n).collect::<Vec<_>>());

        assert_eq!(ranges.len(), 3, "expected a three-way split, got {ranges:?}");
        let mut covered = 0u32;
        for r in &ranges {
            let size = r.end - r.begin;
            covered += size;
            assert!(size <= config.max_partition_size, "range exceeds Smax: {r:?}");
            assert!(size >= config.min_partition_size, "range under Smin: {r:?}");
        }
        assert_eq!(covered, n);
    }
}
