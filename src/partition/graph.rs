//! Compressed-row-storage adjacency graph over Morton-sorted triangles
//! (spec §4.5 "Graph build (done by the orchestrator...)").
//!
//! This is the same compressed-row layout the routing engine this crate is
//! modeled on uses for its on-disk graph formats (`xadj`/`adjncy`-style
//! offsets + targets), built in memory here instead of serialized to disk.

/// A weighted adjacency graph in compressed-row-storage form, indexed by
/// *sorted position* (not triangle id): vertex `i` is the triangle at
/// `GraphPartitioner::indices[i]`.
#[derive(Debug, Default, Clone)]
pub struct GraphData {
    /// `adjacency_offset[i]..adjacency_offset[i+1]` indexes into `adjacency`
    /// / `adjacency_cost` for vertex `i`. Length `num_vertices + 1`.
    pub xadj: Vec<u32>,
    /// Neighbor vertex (sorted position), parallel to `adjacency_cost`.
    pub adjncy: Vec<u32>,
    /// Edge weight parallel to `adjncy`.
    pub adjwgt: Vec<i32>,
}

impl GraphData {
    pub fn num_vertices(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    pub fn neighbors(&self, v: u32) -> impl Iterator<Item = (u32, i32)> + '_ {
        let begin = self.xadj[v as usize] as usize;
        let end = self.xadj[v as usize + 1] as usize;
        self.adjncy[begin..end].iter().copied().zip(self.adjwgt[begin..end].iter().copied())
    }
}

/// Incrementally builds a [`GraphData`] one vertex at a time, matching the
/// original's `NewGraph`/`AddAdjaceny`/`AddLocalityLinks` sequence: call
/// [`GraphBuilder::begin_vertex`], then `add_edge` for each neighbor, for
/// every vertex in order, then [`GraphBuilder::finish`].
#[derive(Default)]
pub struct GraphBuilder {
    xadj: Vec<u32>,
    adjncy: Vec<u32>,
    adjwgt: Vec<i32>,
}

impl GraphBuilder {
    pub fn with_capacity(num_vertices: usize, num_adjacency: usize) -> Self {
        Self {
            xadj: Vec::with_capacity(num_vertices + 1),
            adjncy: Vec::with_capacity(num_adjacency),
            adjwgt: Vec::with_capacity(num_adjacency),
        }
    }

    /// Records the current adjacency-list length as the offset for the next
    /// vertex (spec: `adjacency_offset[i] = current_adj_length`).
    pub fn begin_vertex(&mut self) {
        self.xadj.push(self.adjncy.len() as u32);
    }

    pub fn add_edge(&mut self, neighbor: u32, weight: i32) {
        self.adjncy.push(neighbor);
        self.adjwgt.push(weight);
    }

    pub fn finish(mut self) -> GraphData {
        self.xadj.push(self.adjncy.len() as u32);
        GraphData {
            xadj: self.xadj,
            adjncy: self.adjncy,
            adjwgt: self.adjwgt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_offsets() {
        let mut b = GraphBuilder::with_capacity(3, 4);
        b.begin_vertex();
        b.add_edge(1, 10);
        b.add_edge(2, 20);
        b.begin_vertex();
        b.add_edge(0, 10);
        b.begin_vertex();
        b.add_edge(0, 20);
        let graph = b.finish();

        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.xadj, vec![0, 2, 3, 4]);
        let n0: Vec<_> = graph.neighbors(0).collect();
        assert_eq!(n0, vec![(1, 10), (2, 20)]);
    }
}
