//! Test data builders for creating graphs

use stagegraph::graph::NodeMap;
use stagegraph::{CycleStrategy, DiGraph, Node, NodeSet};
use std::collections::HashMap;

/// Builder for graphs described by labeled edges
pub struct GraphBuilder {
    nodes: HashMap<String, Node>,
    order: Vec<String>,
    edges: Vec<(String, String)>,
    strategy: CycleStrategy,
}

/// A built graph plus lookup of its nodes by label
pub struct BuiltGraph {
    pub graph: DiGraph,
    pub nodes: HashMap<String, Node>,
}

impl BuiltGraph {
    pub fn node(&self, label: &str) -> &Node {
        &self.nodes[label]
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            edges: Vec::new(),
            strategy: CycleStrategy::default(),
        }
    }

    fn ensure(&mut self, label: &str) {
        if !self.nodes.contains_key(label) {
            self.nodes.insert(label.to_string(), Node::labeled(label));
            self.order.push(label.to_string());
        }
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.ensure(from);
        self.ensure(to);
        self.edges.push((from.to_string(), to.to_string()));
        self
    }

    pub fn strategy(mut self, strategy: CycleStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> BuiltGraph {
        let mut map = NodeMap::new();
        for (from, to) in &self.edges {
            map.entry(self.nodes[from].clone())
                .or_insert_with(NodeSet::new)
                .add(self.nodes[to].clone());
        }
        let mut graph = DiGraph::from_mapping(map);
        graph.set_strategy(self.strategy);
        BuiltGraph {
            graph,
            nodes: self.nodes,
        }
    }
}

/// `{A: {a, b}, B: {b, c}, b: {c}}`
pub fn example_graph() -> BuiltGraph {
    GraphBuilder::new()
        .edge("A", "a")
        .edge("A", "b")
        .edge("B", "b")
        .edge("B", "c")
        .edge("b", "c")
        .build()
}

/// Straight chain `n0 → n1 → … → n{len-1}`
pub fn chain_graph(len: usize) -> BuiltGraph {
    let mut builder = GraphBuilder::new();
    for i in 1..len {
        builder = builder.edge(&format!("n{}", i - 1), &format!("n{i}"));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder() {
        let built = GraphBuilder::new().edge("x", "y").build();
        assert_eq!(built.graph.len(), 2);
        assert!(built
            .graph
            .children(built.node("x"))
            .unwrap()
            .contains(built.node("y")));
    }
}
