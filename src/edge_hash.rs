//! Half-edge position hashing and opposite-winding matching (spec §4.2, C2).

use crate::geometry::Vec3;
use crate::hash_table::HashTable;

/// `cycle3(e)`: cyclic successor of a half-edge within its triangle
/// (0→1→2→0). Spec §3: `e - (e%3) + ((1<<(e%3)) & 3)`.
pub fn cycle3(e: u32) -> u32 {
    let m = e % 3;
    e - m + ((1u32 << m) & 3)
}

/// Bit pattern of a float with `-0.0` normalized to `+0.0`, matching spec §3
/// ("each coordinate's bit pattern is taken, with -0 normalized to +0").
fn to_hash_word(f: f32) -> u32 {
    if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

/// One MurmurHash3-32 word transform + accumulate step (spec §3).
fn mix_word(hash: u32, mut w: u32) -> u32 {
    w = w.wrapping_mul(0xcc9e2d51);
    w = w.rotate_left(15);
    w = w.wrapping_mul(0x1b873593);

    let mut h = hash ^ w;
    h = h.rotate_left(13);
    h.wrapping_mul(5).wrapping_add(0xe6546b64)
}

fn murmur_finalize(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Combines an arbitrary number of 32-bit words into one hash, matching the
/// original's `Murmur32({...})` over an initializer list.
fn murmur32(words: &[u32]) -> u32 {
    let mut h = 0u32;
    for &w in words {
        h = mix_word(h, w);
    }
    murmur_finalize(h)
}

/// Deterministic hash of a 3D position (spec §3 "Position hash").
pub fn hash_position(p: Vec3) -> u32 {
    murmur32(&[to_hash_word(p.x), to_hash_word(p.y), to_hash_word(p.z)])
}

fn edge_hash_key(pos0: Vec3, pos1: Vec3) -> u32 {
    murmur32(&[hash_position(pos0), hash_position(pos1)])
}

/// Layer over [`HashTable`] that hashes half-edges by the pair of their
/// endpoint positions and finds opposite-winding matches.
pub struct EdgeHash {
    table: HashTable,
}

impl EdgeHash {
    /// `num` is the anticipated number of half-edges; internally sizes
    /// `H = next_pow2(num)`.
    pub fn new(num: usize) -> Self {
        let hash_size = (num.max(1) as u32).next_power_of_two();
        Self {
            table: HashTable::new(hash_size, num as u32),
        }
    }

    /// Inserts half-edge `e` under the hash of its own directed endpoint
    /// pair. Safe to call from many threads for distinct `e`.
    pub fn add_concurrent(&self, e: u32, get_pos: impl Fn(u32) -> Vec3) {
        let pos0 = get_pos(e);
        let pos1 = get_pos(cycle3(e));
        let hash = edge_hash_key(pos0, pos1);
        self.table.add_concurrent(hash, e);
    }

    /// Invokes `f(e, e')` for every half-edge `e'` sharing `e`'s endpoint
    /// pair in opposite winding. If `add_self` is set, `e` is additionally
    /// inserted under its own *forward* hash afterwards — the same formula
    /// [`EdgeHash::add_concurrent`] uses — so that a later opposite-winding
    /// edge's query (which probes the *swapped* hash, see below) will find it.
    ///
    /// The query itself probes the swapped hash `mix(hash(getPos(cycle3(e))),
    /// hash(getPos(e)))`, not `e`'s own forward hash: a half-edge going the
    /// opposite direction around the same position pair computes that
    /// swapped value as *its own* forward hash when it is inserted (whether
    /// via `add_concurrent` or a prior `add_self`), so probing the swapped
    /// bucket is what actually lands on it. Probing the forward hash instead
    /// (as a literal reading of "compute h as above" might suggest) only
    /// ever finds `e` inserted under its own forward hash — i.e. itself, or
    /// an exact same-winding duplicate — never the opposite-winding partner
    /// this method exists to find.
    pub fn for_all_matching(
        &mut self,
        e: u32,
        add_self: bool,
        get_pos: impl Fn(u32) -> Vec3,
        mut f: impl FnMut(u32, u32),
    ) {
        let pos0 = get_pos(e);
        let pos1 = get_pos(cycle3(e));
        let query_hash = edge_hash_key(pos1, pos0);

        let mut other = self.table.first(query_hash);
        while HashTable::is_valid(other) {
            if pos0.bitwise_eq(get_pos(cycle3(other))) && pos1.bitwise_eq(get_pos(other)) {
                f(e, other);
            }
            other = self.table.next(other);
        }

        if add_self {
            let own_hash = edge_hash_key(pos0, pos1);
            self.table.add(own_hash, e);
        }
    }

    /// Read-only variant of [`EdgeHash::for_all_matching`] for re-querying
    /// without mutating the table (used by the serial complex-edge pass,
    /// spec §4.6 step 5, which must not perturb bucket order mid-scan). See
    /// that method's docs for why the query probes the swapped hash.
    pub fn for_all_matching_readonly(
        &self,
        e: u32,
        get_pos: impl Fn(u32) -> Vec3,
        mut f: impl FnMut(u32, u32),
    ) {
        let pos0 = get_pos(e);
        let pos1 = get_pos(cycle3(e));
        let query_hash = edge_hash_key(pos1, pos0);

        let mut other = self.table.first(query_hash);
        while HashTable::is_valid(other) {
            if pos0.bitwise_eq(get_pos(cycle3(other))) && pos1.bitwise_eq(get_pos(other)) {
                f(e, other);
            }
            other = self.table.next(other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle3_is_a_3_cycle() {
        assert_eq!(cycle3(0), 1);
        assert_eq!(cycle3(1), 2);
        assert_eq!(cycle3(2), 0);
        assert_eq!(cycle3(3), 4);
        assert_eq!(cycle3(5), 3);
    }

    #[test]
    fn equal_positions_hash_equal_after_sign_normalization() {
        let a = Vec3::new(-0.0, 1.0, -0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(hash_position(a), hash_position(b));
    }

    #[test]
    fn matches_only_opposite_winding() {
        // Two triangles sharing edge (v1, v2): tri0 = (v0,v1,v2), tri1 = (v2,v1,v3)
        let verts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        let indices = [0u32, 1, 2, 2, 1, 3];
        let get_pos = |e: u32| verts[indices[e as usize] as usize];

        let mut edge_hash = EdgeHash::new(indices.len());
        for e in 0..indices.len() as u32 {
            edge_hash.add_concurrent(e, get_pos);
        }

        // half-edge 1 is v1->v2 (tri0); half-edge 3 is v2->v1 (tri1): opposite winding.
        let mut matches = vec![];
        edge_hash.for_all_matching_readonly(1, get_pos, |e, other| matches.push((e, other)));
        assert_eq!(matches, vec![(1, 3)]);

        // half-edge 0 is v0->v1: shares no opposite-winding twin.
        let mut matches0 = vec![];
        edge_hash.for_all_matching_readonly(0, get_pos, |e, other| matches0.push((e, other)));
        assert!(matches0.is_empty());
    }

    #[test]
    fn non_manifold_fan_produces_multiple_matches() {
        // Three triangles all sharing the directed edge (v1,v2) in opposite
        // winding from three different fan triangles incident on (v2,v1).
        let verts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
        ];
        // tri0 = (v0,v1,v2) has half-edge v1->v2 at index 1.
        // tri1 = (v2,v1,v3), tri2 = (v2,v1,v4): both have half-edge v2->v1 at index 0.
        let indices = [0u32, 1, 2, 2, 1, 3, 2, 1, 4];
        let get_pos = |e: u32| verts[indices[e as usize] as usize];

        let mut edge_hash = EdgeHash::new(indices.len());
        for e in 0..indices.len() as u32 {
            edge_hash.add_concurrent(e, get_pos);
        }

        let mut matches = vec![];
        edge_hash.for_all_matching_readonly(1, get_pos, |e, other| matches.push((e, other)));
        let mut others: Vec<u32> = matches.iter().map(|&(_, o)| o).collect();
        others.sort_unstable();
        assert_eq!(others, vec![3, 6]);
    }
}
