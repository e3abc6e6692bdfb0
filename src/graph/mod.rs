//! Directed-graph layer: nodes, the adjacency view, and the mutable graph.
//!
//! ```text
//! Node ──► NodeSet ──► NodeMap ──► NodeMapping ──► DiGraph
//!                                   (matrix,        (mutation,
//!                                    cycles,         queries,
//!                                    topo order)     execute)
//! ```

pub mod digraph;
pub mod id;
pub mod mapping;
pub mod node;

pub use digraph::DiGraph;
pub use id::{NodeId, NodeIdGenerator};
pub use mapping::{AdjacencyMatrix, CycleStrategy, NodeMap, NodeMapping};
pub use node::{Node, NodeBuilder, NodeCallback, NodeSet};
