//! Graph partitioner (spec §4.5, component C5): locality links, CSR graph
//! construction, and recursive size-bounded bisection.

pub mod bisect;
pub mod graph;
pub mod locality;

pub use bisect::{GraphBisector, GreedyGraphGrowing, Partition};
pub use graph::{GraphBuilder, GraphData};
pub use locality::{build_locality_links, LocalityLinks, Range};
