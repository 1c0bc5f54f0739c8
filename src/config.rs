//! Tunable constants for the clustering pipeline.
//!
//! The spec hard-codes these (cluster size bounds, scan radii, non-manifold
//! edge weight...); collecting them here keeps the algorithm modules free of
//! magic numbers, the way `profile_abi`/`profiles` bundle per-mode tunables
//! in the routing engine this crate is modeled on.

/// Target triangle count of a single cluster.
pub const DEFAULT_CLUSTER_SIZE: u32 = 128;

/// `Smax - Smin`: how far under the target size a cluster may fall.
pub const DEFAULT_SIZE_SLACK: u32 = 4;

/// Edge weight used for real topological adjacency in the bisection graph.
/// `4 * 65`: chosen so that cutting a locality link (weight 1) is vastly
/// preferred over cutting a real mesh edge.
pub const ADJACENCY_WEIGHT: i32 = 4 * 65;

/// Edge weight used for spatial locality links in the bisection graph.
pub const LOCALITY_WEIGHT: i32 = 1;

/// Islands at or above this size are considered already cluster-sized and
/// are excluded from locality-link emission.
pub const LOCALITY_ISLAND_THRESHOLD: u32 = 128;

/// Maximum accepted locality links kept per triangle (closest-5 rule).
pub const MAX_LOCALITY_LINKS: usize = 5;

/// Maximum forward/backward steps taken during the Morton-order locality scan.
pub const LOCALITY_SCAN_RADIUS: usize = 16;

/// Below this triangle count, `PartitionStrict` does not parallelize sibling
/// bisections (mirrors the original's `num_triangles >= 5000` threshold for
/// `enable_multi_threaded`).
pub const PARALLEL_BISECT_THRESHOLD: usize = 5000;

/// Batch size handed to the parallel-for driver for per-half-edge work.
pub const EDGE_BATCH_SIZE: usize = 1024;

/// Batch size handed to the parallel-for driver for per-triangle work
/// (Morton key computation).
pub const TRIANGLE_BATCH_SIZE: usize = 4096;

/// Size and balance tunables for one invocation of the pipeline.
///
/// `Default` reproduces the spec's constants (`Smax = 128`, `Smin = 124`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    pub min_partition_size: u32,
    pub max_partition_size: u32,
}

impl ClusterConfig {
    /// Constructs a config for a given target cluster size and slack,
    /// matching `GraphPartitioner(T, ClusterSize - slack, ClusterSize)`.
    pub fn new(max_partition_size: u32, slack: u32) -> Self {
        crate::contract::contract!(max_partition_size > slack);
        Self {
            min_partition_size: max_partition_size - slack,
            max_partition_size,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_SIZE, DEFAULT_SIZE_SLACK)
    }
}
