//! Mutable directed graph over a node → children mapping.
//!
//! Every mutation edits a working copy of the mapping and then swaps in a
//! freshly built [`NodeMapping`]; adjacency is never patched incrementally.
//! Mutations take `&mut self`, so a graph shared across threads has to be
//! wrapped in a lock by the caller.

use crate::config::GraphConfig;
use crate::error::{Result, StageGraphError};
use crate::graph::mapping::{CycleStrategy, NodeMap, NodeMapping};
use crate::graph::node::{Node, NodeSet};

/// Directed graph of pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct DiGraph {
    mapping: NodeMapping,
    strategy: CycleStrategy,
}

impl DiGraph {
    /// Create an empty graph using the default cycle strategy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: CycleStrategy) -> Self {
        Self {
            mapping: NodeMapping::default(),
            strategy,
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::with_strategy(config.cycle_strategy)
    }

    /// Build a graph from an existing node → children mapping.
    pub fn from_mapping(mapping: NodeMap) -> Self {
        Self {
            mapping: NodeMapping::build(mapping),
            strategy: CycleStrategy::default(),
        }
    }

    pub fn strategy(&self) -> CycleStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: CycleStrategy) {
        self.strategy = strategy;
    }

    /// Current adjacency view.
    pub fn mapping(&self) -> &NodeMapping {
        &self.mapping
    }

    /// Every node in the graph, in index order.
    pub fn nodes(&self) -> &NodeSet {
        self.mapping.nodes()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.mapping.contains(node)
    }

    fn working_copy(&self) -> NodeMap {
        self.mapping.mapping().clone()
    }

    fn replace(&mut self, mapping: NodeMap) {
        self.mapping = NodeMapping::build(mapping);
        tracing::debug!(
            nodes = self.mapping.len(),
            "Graph mapping rebuilt"
        );
    }

    fn require_known(&self, node: &Node) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(StageGraphError::UnknownNode { node: node.clone() })
        }
    }

    // ── Mutation ──

    /// Register `node` together with edges `parent → node` and `node → child`.
    pub fn add_node<'a, P, C>(&mut self, node: &Node, parents: P, children: C)
    where
        P: IntoIterator<Item = &'a Node>,
        C: IntoIterator<Item = &'a Node>,
    {
        let mut map = self.working_copy();
        let entry = map.entry(node.clone()).or_default();
        entry.extend(children.into_iter().cloned());
        for parent in parents {
            map.entry(parent.clone()).or_default().add(node.clone());
        }
        self.replace(map);
    }

    /// Register `node` without any edges.
    pub fn insert(&mut self, node: &Node) {
        self.add_node(node, std::iter::empty(), std::iter::empty());
    }

    /// Add each of `children` to `node`'s child set, creating the entry if
    /// `node` has none yet.
    pub fn add_children<'a>(&mut self, node: &Node, children: impl IntoIterator<Item = &'a Node>) {
        let mut map = self.working_copy();
        map.entry(node.clone())
            .or_default()
            .extend(children.into_iter().cloned());
        self.replace(map);
    }

    /// Remove each of `children` from `node`'s child set. Children that are
    /// not present are ignored.
    pub fn remove_children<'a>(
        &mut self,
        node: &Node,
        children: impl IntoIterator<Item = &'a Node>,
    ) -> Result<()> {
        self.require_known(node)?;

        let mut map = self.working_copy();
        let mut removed = 0;
        if let Some(set) = map.get_mut(node) {
            for child in children {
                if set.remove(child) {
                    removed += 1;
                }
            }
        }

        if removed == 0 {
            tracing::trace!(node = %node, "remove_children: nothing to remove");
            return Ok(());
        }
        self.replace(map);
        Ok(())
    }

    /// Add `node` as a child of each of `parents`.
    pub fn add_parents<'a>(&mut self, node: &Node, parents: impl IntoIterator<Item = &'a Node>) {
        let mut map = self.working_copy();
        for parent in parents {
            map.entry(parent.clone()).or_default().add(node.clone());
        }
        self.replace(map);
    }

    /// Remove `node` from the child set of each of `parents`. All parents
    /// must be known to the graph; nothing changes if one is not.
    pub fn remove_parents<'a>(
        &mut self,
        node: &Node,
        parents: impl IntoIterator<Item = &'a Node>,
    ) -> Result<()> {
        self.require_known(node)?;
        let parents: Vec<&Node> = parents.into_iter().collect();
        for parent in &parents {
            self.require_known(parent)?;
        }

        let mut map = self.working_copy();
        let mut removed = 0;
        for parent in parents {
            if let Some(set) = map.get_mut(parent) {
                if set.remove(node) {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            self.replace(map);
        }
        Ok(())
    }

    // ── Queries ──

    /// Children of `node` as recorded in the mapping.
    pub fn children(&self, node: &Node) -> Result<NodeSet> {
        self.mapping
            .children_of(node)
            .ok_or_else(|| StageGraphError::UnknownNode { node: node.clone() })
    }

    /// Nodes with an edge into `node`.
    pub fn parents(&self, node: &Node) -> Result<NodeSet> {
        self.mapping
            .parents_of(node)
            .ok_or_else(|| StageGraphError::UnknownNode { node: node.clone() })
    }

    /// Nodes that lie on a cycle, using the configured strategy.
    pub fn find_cycles(&self) -> NodeSet {
        self.mapping.find_cycles_with(self.strategy)
    }

    pub fn has_cycles(&self) -> bool {
        !self.find_cycles().is_empty()
    }

    /// `Err(CycleDetected)` naming the cycle members if the graph has a cycle.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let nodes = self.find_cycles();
        if nodes.is_empty() {
            Ok(())
        } else {
            tracing::warn!(cycle = %nodes, "Graph contains a cycle");
            Err(StageGraphError::CycleDetected { nodes })
        }
    }

    /// Nodes ordered so every parent precedes its children.
    pub fn topological_order(&self) -> Result<Vec<Node>> {
        match self.mapping.topological_order() {
            Some(order) => Ok(order),
            None => Err(StageGraphError::CycleDetected {
                nodes: self.find_cycles(),
            }),
        }
    }

    /// Check for cycles, then invoke every node's callback in topological
    /// order. Stops at the first failing callback. Returns the nodes in the
    /// order they ran.
    pub fn execute(&self) -> Result<Vec<Node>> {
        self.ensure_acyclic()?;
        let order = self.topological_order()?;

        tracing::info!(nodes = order.len(), "Executing graph");
        for node in &order {
            tracing::debug!(node = %node, label = node.label(), "Invoking node");
            node.invoke().map_err(|e| {
                tracing::error!(node = %node, "Node callback failed: {e:#}");
                StageGraphError::component(node.label(), e)
            })?;
        }

        Ok(order)
    }
}
