//! Indexed adjacency view over a node → children mapping.
//!
//! A [`NodeMapping`] is derived once from a [`NodeMap`] and never edited in
//! place; [`DiGraph`](crate::graph::DiGraph) rebuilds it after every mutation.
//!
//! # Cycle detection
//!
//! Two strategies report the same set of nodes:
//!
//! - [`CycleStrategy::MatrixPower`] sums `A^1 + … + A^n` and reports every
//!   node with a non-zero diagonal entry, i.e. a closed walk of length ≤ n.
//!   It costs `n` matrix products of `O(n³)` each and is meant for graphs of
//!   tens to low hundreds of stages.
//! - [`CycleStrategy::DepthFirst`] runs Tarjan's strongly-connected-component
//!   search in `O(n + e)` and reports members of non-trivial components plus
//!   nodes with self-loops.

use crate::graph::node::{Node, NodeSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Parent → children relation that a graph is built from.
pub type NodeMap = IndexMap<Node, NodeSet>;

/// Algorithm used to find nodes that lie on a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStrategy {
    /// Diagonal of the summed adjacency-matrix powers.
    #[default]
    MatrixPower,
    /// Tarjan strongly-connected components.
    DepthFirst,
}

impl std::fmt::Display for CycleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStrategy::MatrixPower => write!(f, "matrix-power"),
            CycleStrategy::DepthFirst => write!(f, "depth-first"),
        }
    }
}

/// Dense `n × n` matrix of edge counts. Arithmetic saturates so a non-zero
/// entry never wraps back to zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjacencyMatrix {
    n: usize,
    data: Vec<u64>,
}

impl AdjacencyMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data[row * self.n + col]
    }

    #[inline]
    fn increment(&mut self, row: usize, col: usize) {
        let cell = &mut self.data[row * self.n + col];
        *cell = cell.saturating_add(1);
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Matrix product `self · other`.
    pub fn multiply(&self, other: &AdjacencyMatrix) -> AdjacencyMatrix {
        debug_assert_eq!(self.n, other.n);
        let n = self.n;
        let mut out = AdjacencyMatrix::zeros(n);

        for i in 0..n {
            for k in 0..n {
                let a = self.get(i, k);
                if a == 0 {
                    continue;
                }
                for j in 0..n {
                    let b = other.get(k, j);
                    if b == 0 {
                        continue;
                    }
                    let cell = &mut out.data[i * n + j];
                    *cell = cell.saturating_add(a.saturating_mul(b));
                }
            }
        }

        out
    }

    fn add_assign(&mut self, other: &AdjacencyMatrix) {
        for (lhs, rhs) in self.data.iter_mut().zip(&other.data) {
            *lhs = lhs.saturating_add(*rhs);
        }
    }

    /// Diagonal entries, row order.
    pub fn diagonal(&self) -> Vec<u64> {
        (0..self.n).map(|i| self.get(i, i)).collect()
    }

    /// Column indices with a non-zero entry in `row`.
    fn successors(&self, row: usize) -> Vec<usize> {
        (0..self.n).filter(|&col| self.get(row, col) > 0).collect()
    }
}

/// Adjacency view derived from a [`NodeMap`].
#[derive(Debug, Clone, Default)]
pub struct NodeMapping {
    mapping: NodeMap,
    /// Every node in first-seen order: each key, then its children.
    nodes: NodeSet,
    adjacency: AdjacencyMatrix,
}

impl NodeMapping {
    /// Derive the node index and adjacency matrix from `mapping`.
    pub fn build(mapping: NodeMap) -> Self {
        let mut nodes = NodeSet::new();
        for (parent, children) in &mapping {
            nodes.add(parent.clone());
            nodes.extend(children.iter().cloned());
        }

        let mut adjacency = AdjacencyMatrix::zeros(nodes.len());
        for (parent, children) in &mapping {
            let row = nodes.index_of(parent).unwrap_or_default();
            for child in children {
                if let Some(col) = nodes.index_of(child) {
                    adjacency.increment(row, col);
                }
            }
        }

        tracing::trace!(
            nodes = nodes.len(),
            entries = mapping.len(),
            "Built node mapping"
        );

        Self {
            mapping,
            nodes,
            adjacency,
        }
    }

    /// The mapping this view was built from.
    pub fn mapping(&self) -> &NodeMap {
        &self.mapping
    }

    pub fn into_mapping(self) -> NodeMap {
        self.mapping
    }

    /// Every node, indexed in first-seen order.
    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    pub fn index_of(&self, node: &Node) -> Option<usize> {
        self.nodes.index_of(node)
    }

    pub fn adjacency(&self) -> &AdjacencyMatrix {
        &self.adjacency
    }

    /// Children recorded for `node`. `None` if the node is unknown; a known
    /// node without an entry has no children.
    pub fn children_of(&self, node: &Node) -> Option<NodeSet> {
        if !self.contains(node) {
            return None;
        }
        Some(self.mapping.get(node).cloned().unwrap_or_default())
    }

    /// Nodes with an edge into `node`, in index order. `None` if unknown.
    pub fn parents_of(&self, node: &Node) -> Option<NodeSet> {
        let col = self.index_of(node)?;
        let matrix = &self.adjacency;
        Some(
            (0..self.len())
                .filter(|&row| matrix.get(row, col) > 0)
                .filter_map(|row| self.nodes.get(row).cloned())
                .collect(),
        )
    }

    /// `T = A^1 + A^2 + … + A^n`; `T[i][j]` counts walks of length ≤ n from i to j.
    pub fn walk_counts(&self) -> AdjacencyMatrix {
        let a = &self.adjacency;
        let mut total = a.clone();
        let mut power = a.clone();

        for _ in 2..=a.size() {
            power = power.multiply(a);
            // A nilpotent matrix stays zero from here on.
            if power.is_zero() {
                break;
            }
            total.add_assign(&power);
        }

        total
    }

    /// Nodes that lie on a cycle, via [`CycleStrategy::MatrixPower`].
    pub fn find_cycles(&self) -> NodeSet {
        self.find_cycles_with(CycleStrategy::MatrixPower)
    }

    /// Nodes that lie on a cycle, in index order. Empty when acyclic.
    pub fn find_cycles_with(&self, strategy: CycleStrategy) -> NodeSet {
        let on_cycle: Vec<bool> = match strategy {
            CycleStrategy::MatrixPower => self
                .walk_counts()
                .diagonal()
                .into_iter()
                .map(|count| count > 0)
                .collect(),
            CycleStrategy::DepthFirst => self.tarjan_cycle_members(),
        };

        on_cycle
            .into_iter()
            .enumerate()
            .filter(|(_, member)| *member)
            .filter_map(|(idx, _)| self.nodes.get(idx).cloned())
            .collect()
    }

    fn tarjan_cycle_members(&self) -> Vec<bool> {
        const UNVISITED: usize = usize::MAX;

        let n = self.len();
        let matrix = &self.adjacency;
        let adj: Vec<Vec<usize>> = (0..n).map(|row| matrix.successors(row)).collect();

        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack = Vec::new();
        let mut on_cycle = vec![false; n];
        let mut next_index = 0;

        for root in 0..n {
            if index[root] != UNVISITED {
                continue;
            }

            index[root] = next_index;
            lowlink[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;

            // (node, position of the next successor to visit)
            let mut work: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = work.last_mut() {
                let v = frame.0;
                if let Some(&w) = adj[v].get(frame.1) {
                    frame.1 += 1;
                    if index[w] == UNVISITED {
                        index[w] = next_index;
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        work.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index[w]);
                    }
                    continue;
                }

                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }

                if lowlink[v] == index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    if component.len() > 1 || adj[v].contains(&v) {
                        for w in component {
                            on_cycle[w] = true;
                        }
                    }
                }
            }
        }

        on_cycle
    }

    /// Kahn's algorithm; ties resolved in index order. `None` if there is a cycle.
    pub fn topological_order(&self) -> Option<Vec<Node>> {
        let n = self.len();
        let matrix = &self.adjacency;

        let mut in_degree = vec![0u64; n];
        for row in 0..n {
            for (col, degree) in in_degree.iter_mut().enumerate() {
                *degree = degree.saturating_add(matrix.get(row, col));
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            for w in matrix.successors(v) {
                in_degree[w] = in_degree[w].saturating_sub(matrix.get(v, w));
                if in_degree[w] == 0 {
                    queue.push_back(w);
                }
            }
        }

        if order.len() < n {
            return None;
        }

        Some(
            order
                .into_iter()
                .filter_map(|idx| self.nodes.get(idx).cloned())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(nodes: &[&Node]) -> NodeSet {
        nodes.iter().copied().collect()
    }

    fn chain(len: usize) -> (Vec<Node>, NodeMap) {
        let nodes: Vec<Node> = (0..len).map(|_| Node::new()).collect();
        let mut map = NodeMap::new();
        for pair in nodes.windows(2) {
            map.insert(pair[0].clone(), set(&[&pair[1]]));
        }
        (nodes, map)
    }

    #[test]
    fn test_index_is_first_seen_order() {
        let a = Node::labeled("a");
        let b = Node::labeled("b");
        let c = Node::labeled("c");
        let mut map = NodeMap::new();
        map.insert(a.clone(), set(&[&c]));
        map.insert(b.clone(), set(&[&c]));

        let mapping = NodeMapping::build(map);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.index_of(&a), Some(0));
        assert_eq!(mapping.index_of(&c), Some(1));
        assert_eq!(mapping.index_of(&b), Some(2));

        let adj = mapping.adjacency();
        assert_eq!(adj.get(0, 1), 1);
        assert_eq!(adj.get(2, 1), 1);
        assert_eq!(adj.get(1, 0), 0);
    }

    #[test]
    fn test_acyclic_chain_has_no_cycles() {
        let (_, map) = chain(6);
        let mapping = NodeMapping::build(map);
        assert!(mapping.find_cycles().is_empty());
        assert!(mapping
            .find_cycles_with(CycleStrategy::DepthFirst)
            .is_empty());
    }

    #[test]
    fn test_back_edge_reports_exactly_the_cycle() {
        // n0 → n1 → n2 → n3 → n4, plus n3 → n1
        let (nodes, mut map) = chain(5);
        map.get_mut(&nodes[3]).unwrap().add(nodes[1].clone());

        let mapping = NodeMapping::build(map);
        let expected = set(&[&nodes[1], &nodes[2], &nodes[3]]);
        assert_eq!(mapping.find_cycles(), expected);
        assert_eq!(mapping.find_cycles_with(CycleStrategy::DepthFirst), expected);
    }

    #[test]
    fn test_self_loop_is_cycle_of_one() {
        let a = Node::new();
        let b = Node::new();
        let mut map = NodeMap::new();
        map.insert(a.clone(), set(&[&a, &b]));

        let mapping = NodeMapping::build(map);
        assert_eq!(mapping.find_cycles(), set(&[&a]));
        assert_eq!(mapping.find_cycles_with(CycleStrategy::DepthFirst), set(&[&a]));
    }

    #[test]
    fn test_walk_counts_of_triangle() {
        let (nodes, mut map) = chain(3);
        map.insert(nodes[2].clone(), set(&[&nodes[0]]));

        let t = NodeMapping::build(map).walk_counts();
        // One closed walk of length 3 per node.
        assert_eq!(t.diagonal(), vec![1, 1, 1]);
    }

    #[test]
    fn test_walk_counts_saturate() {
        // Complete digraph with self-loops: entries grow like n^k.
        let nodes: Vec<Node> = (0..40).map(|_| Node::new()).collect();
        let all: NodeSet = nodes.iter().collect();
        let map: NodeMap = nodes.iter().map(|n| (n.clone(), all.clone())).collect();

        let t = NodeMapping::build(map).walk_counts();
        assert!(t.diagonal().iter().all(|&v| v > 0));
        assert_eq!(t.get(0, 0), u64::MAX);
    }

    #[test]
    fn test_parents_and_children() {
        let (nodes, map) = chain(3);
        let mapping = NodeMapping::build(map);

        assert_eq!(mapping.children_of(&nodes[0]), Some(set(&[&nodes[1]])));
        assert_eq!(mapping.children_of(&nodes[2]), Some(NodeSet::new()));
        assert_eq!(mapping.parents_of(&nodes[2]), Some(set(&[&nodes[1]])));
        assert_eq!(mapping.parents_of(&nodes[0]), Some(NodeSet::new()));
        assert!(mapping.children_of(&Node::new()).is_none());
        assert!(mapping.parents_of(&Node::new()).is_none());
    }

    #[test]
    fn test_topological_order_diamond() {
        let a = Node::labeled("a");
        let b = Node::labeled("b");
        let c = Node::labeled("c");
        let d = Node::labeled("d");
        let mut map = NodeMap::new();
        map.insert(a.clone(), set(&[&b, &c]));
        map.insert(b.clone(), set(&[&d]));
        map.insert(c.clone(), set(&[&d]));

        let order = NodeMapping::build(map).topological_order().unwrap();
        let pos = |n: &Node| order.iter().position(|x| x == n).unwrap();
        assert!(pos(&a) < pos(&b));
        assert!(pos(&a) < pos(&c));
        assert!(pos(&b) < pos(&d));
        assert!(pos(&c) < pos(&d));
    }

    #[test]
    fn test_topological_order_rejects_cycle() {
        let (nodes, mut map) = chain(3);
        map.insert(nodes[2].clone(), set(&[&nodes[0]]));
        assert!(NodeMapping::build(map).topological_order().is_none());
    }

    #[test]
    fn test_empty_mapping() {
        let mapping = NodeMapping::build(NodeMap::new());
        assert!(mapping.is_empty());
        assert!(mapping.find_cycles().is_empty());
        assert_eq!(mapping.topological_order(), Some(Vec::new()));
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    fn graph_from_edges(size: usize, edges: &[(usize, usize)]) -> NodeMapping {
        let nodes: Vec<Node> = (0..size).map(|_| Node::new()).collect();
        let mut map = NodeMap::new();
        for node in &nodes {
            map.insert(node.clone(), NodeSet::new());
        }
        for &(from, to) in edges {
            let (from, to) = (from % size, to % size);
            if let Some(children) = map.get_mut(&nodes[from]) {
                children.add(nodes[to].clone());
            }
        }
        NodeMapping::build(map)
    }

    proptest! {
        #[test]
        fn test_strategies_agree(
            size in 1usize..12,
            edges in prop::collection::vec((0usize..12, 0usize..12), 0..40)
        ) {
            let mapping = graph_from_edges(size, &edges);
            prop_assert_eq!(
                mapping.find_cycles_with(CycleStrategy::MatrixPower),
                mapping.find_cycles_with(CycleStrategy::DepthFirst)
            );
        }

        #[test]
        fn test_forward_edges_never_cycle(
            size in 2usize..12,
            edges in prop::collection::vec((0usize..12, 0usize..12), 0..40)
        ) {
            // Only keep edges from a lower to a strictly higher index.
            let forward: Vec<(usize, usize)> = edges
                .into_iter()
                .map(|(a, b)| (a % size, b % size))
                .filter(|(a, b)| a < b)
                .collect();
            let mapping = graph_from_edges(size, &forward);
            prop_assert!(mapping.find_cycles().is_empty());
            prop_assert!(mapping.topological_order().is_some());
        }

        #[test]
        fn test_cycle_members_iff_no_topological_order(
            size in 1usize..10,
            edges in prop::collection::vec((0usize..10, 0usize..10), 0..25)
        ) {
            let mapping = graph_from_edges(size, &edges);
            prop_assert_eq!(
                mapping.find_cycles().is_empty(),
                mapping.topological_order().is_some()
            );
        }
    }
}
