//! Union-find with a "merge-smaller-root-into-larger" rule (spec §4.4, C4).
//!
//! Unlike textbook union-find, parents always point to an index `>=`
//! themselves; a root is self-parented and is always the *largest* element
//! in its tree. This gives the locality scan (§4.5) a stable island
//! identifier it can read with a single array access in the common case,
//! and falls out for free from the ascending-order union pass used by the
//! orchestrator (spec §4.6 step 5).

use crate::contract::contract;

pub struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    pub fn new(size: u32) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Current (possibly stale, pre-compaction) parent of `i`.
    pub fn parent_of(&self, i: u32) -> u32 {
        self.parent[i as usize]
    }

    /// General-purpose union: climbs both `x` and `y` upward, repeatedly
    /// repointing the smaller-rooted path to the larger root, until both
    /// ascending pointers agree. Safe for arbitrary `x, y` in either order.
    pub fn union(&mut self, mut x: u32, mut y: u32) {
        let mut px = self.parent[x as usize];
        let mut py = self.parent[y as usize];

        while px != py {
            if px < py {
                self.parent[x as usize] = py;
                if x == px {
                    return;
                }
                x = px;
                px = self.parent[x as usize];
            } else {
                self.parent[y as usize] = px;
                if y == py {
                    return;
                }
                y = py;
                py = self.parent[y as usize];
            }
        }
    }

    /// Fast-path union for an ascending iteration `i = 0..T` where `x` is
    /// the current root (`x >= y`, `parent[x] == x`). Climbs from `y`
    /// upward, repointing each ancestor straight at `x`, until reaching
    /// `y`'s prior root.
    ///
    /// Precondition violations are contract violations (spec §7
    /// `InvariantViolation`), not recoverable input errors: callers outside
    /// the orchestrator's ascending pass should use [`DisjointSet::union`]
    /// instead.
    pub fn union_sequential(&mut self, x: u32, mut y: u32) {
        contract!(x >= y, "UnionSequential requires x >= y");
        contract!(self.parent[x as usize] == x, "UnionSequential requires x to be a root");

        let mut py = self.parent[y as usize];
        while x != py {
            self.parent[y as usize] = x;
            if y == py {
                return;
            }
            y = py;
            py = self.parent[y as usize];
        }
    }

    /// Two-pass find with path compression: ascend to the root, then ascend
    /// again rewriting every visited node's parent directly to the root.
    /// Returns the root, which is always the maximum index in its tree.
    pub fn find(&mut self, i: u32) -> u32 {
        let mut root = i;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }

        let mut cur = i;
        while cur != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }

        root
    }
}
