//! Per-half-edge neighbor store (spec §4.3, component C3).
//!
//! The common case — a manifold edge shared by exactly two triangles — is
//! stored in a flat `direct` slot per half-edge. Non-manifold edges (more
//! than one opposing match) spill into an `extended` multimap. This split
//! optimizes for the common case while keeping a correct escape hatch for
//! non-manifold geometry (see DESIGN.md).

use std::collections::HashMap;

/// Sentinel meaning "no direct neighbor yet".
pub const UNLINKED: i32 = -1;
/// Sentinel meaning "more than one opposing match was seen; resolved via `extended`".
pub const COMPLEX: i32 = -2;

pub struct Adjacency {
    pub direct: Vec<i32>,
    extended: HashMap<i32, Vec<i32>>,
}

impl Adjacency {
    pub fn new(num_half_edges: usize) -> Self {
        Self {
            direct: vec![UNLINKED; num_half_edges],
            extended: HashMap::new(),
        }
    }

    /// Builds an `Adjacency` whose `direct` slots are already populated
    /// (spec §4.6 step 3: the parallel match-count pass writes `direct`
    /// directly, before the serial pass resolves `COMPLEX` entries via
    /// [`Adjacency::link`]).
    pub fn from_direct(direct: Vec<i32>) -> Self {
        Self {
            direct,
            extended: HashMap::new(),
        }
    }

    /// Adds `(key, value)` to `extended` only if not already present for
    /// that key (spec §4.3 `AddUnique`).
    pub fn add_unique(&mut self, key: i32, value: i32) {
        let entries = self.extended.entry(key).or_default();
        if !entries.contains(&value) {
            entries.push(value);
        }
    }

    /// Links `e0` and `e1`. If both are still unlinked, stores them directly
    /// in each other's `direct` slot; otherwise both directions are recorded
    /// symmetrically in `extended`, without duplicating existing entries.
    pub fn link(&mut self, e0: i32, e1: i32) {
        if self.direct[e0 as usize] < 0 && self.direct[e1 as usize] < 0 {
            self.direct[e0 as usize] = e1;
            self.direct[e1 as usize] = e0;
        } else {
            self.add_unique(e0, e1);
            self.add_unique(e1, e0);
        }
    }

    /// Invokes `f(e, neighbor)` for every neighbor of `e`: the direct slot
    /// (if linked) followed by every entry in `extended[e]`.
    pub fn for_all(&self, e: i32, mut f: impl FnMut(i32, i32)) {
        let d = self.direct[e as usize];
        if d >= 0 {
            f(e, d);
        }
        if let Some(entries) = self.extended.get(&e) {
            for &other in entries {
                f(e, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_uses_direct_slot_when_both_unlinked() {
        let mut adj = Adjacency::new(4);
        adj.link(1, 3);
        assert_eq!(adj.direct[1], 3);
        assert_eq!(adj.direct[3], 1);
    }

    #[test]
    fn link_spills_to_extended_for_non_manifold_edges() {
        let mut adj = Adjacency::new(9);
        adj.link(1, 3);
        adj.link(1, 6);

        let mut neighbors = vec![];
        adj.for_all(1, |_, n| neighbors.push(n));
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![3, 6]);

        // symmetry: every neighbor relation is reciprocal.
        let mut back3 = vec![];
        adj.for_all(3, |_, n| back3.push(n));
        assert_eq!(back3, vec![1]);

        let mut back6 = vec![];
        adj.for_all(6, |_, n| back6.push(n));
        assert_eq!(back6, vec![1]);
    }

    #[test]
    fn add_unique_does_not_duplicate() {
        let mut adj = Adjacency::new(4);
        adj.add_unique(0, 1);
        adj.add_unique(0, 1);
        let mut count = 0;
        adj.for_all(0, |_, _| count += 1);
        assert_eq!(count, 1);
    }
}
