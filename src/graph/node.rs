//! Graph vertices.
//!
//! A [`Node`] is a cheap, cloneable handle. Clones refer to the same vertex;
//! equality and hashing follow the handle, never the label, so two distinct
//! nodes may share a label.
//!
//! Parents and children given at construction are recorded on the node as-is.
//! The node does not register itself on them; symmetric bookkeeping is the
//! job of [`DiGraph`](crate::graph::DiGraph).

use crate::graph::id::{NodeId, NodeIdGenerator};
use indexmap::IndexSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// External logic bound to a node at construction time.
pub type NodeCallback = Arc<dyn Fn(&Node) -> anyhow::Result<()> + Send + Sync>;

struct NodeData {
    id: NodeId,
    label: String,
    parents: NodeSet,
    children: NodeSet,
    callback: Option<NodeCallback>,
}

/// A vertex in the orchestration graph.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeData>,
}

impl Node {
    /// Create an unlabeled node; its label defaults to `node_<id>`.
    pub fn new() -> Self {
        NodeBuilder::default().build()
    }

    /// Create a node with the given label.
    pub fn labeled(label: impl Into<String>) -> Self {
        NodeBuilder::default().label(label).build()
    }

    pub fn builder() -> NodeBuilder {
        NodeBuilder::default()
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Parents supplied at construction.
    pub fn parents(&self) -> &NodeSet {
        &self.inner.parents
    }

    /// Children supplied at construction.
    pub fn children(&self) -> &NodeSet {
        &self.inner.children
    }

    pub fn has_callback(&self) -> bool {
        self.inner.callback.is_some()
    }

    /// Run the bound callback. A node without one does nothing.
    pub fn invoke(&self) -> anyhow::Result<()> {
        match &self.inner.callback {
            Some(callback) => callback(self),
            None => Ok(()),
        }
    }

    /// Whether `self` and `other` are the same vertex.
    pub fn same_as(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Multi-line summary of the node and its construction-time neighbours.
    ///
    /// ```text
    /// parents   [Node 0]
    /// self      Node 1
    /// children  [Node 2, Node 3]
    /// ```
    ///
    /// Lines with nothing to show are left out.
    pub fn describe(&self) -> String {
        let rows = [
            ("parents", self.parents().to_string()),
            ("self", self.to_string()),
            ("children", self.children().to_string()),
        ];

        rows.iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| format!("{name:<10}{value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {}", self.inner.id)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Neighbours are printed by id only; nodes can reference each other.
        f.debug_struct("Node")
            .field("id", &self.inner.id.value())
            .field("label", &self.inner.label)
            .field("parents", &self.inner.parents.ids())
            .field("children", &self.inner.children.ids())
            .field("callback", &self.has_callback())
            .finish()
    }
}

/// Builder for [`Node`].
#[derive(Default)]
pub struct NodeBuilder {
    label: Option<String>,
    parents: NodeSet,
    children: NodeSet,
    callback: Option<NodeCallback>,
}

impl NodeBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn parents<'a>(mut self, parents: impl IntoIterator<Item = &'a Node>) -> Self {
        self.parents.extend(parents.into_iter().cloned());
        self
    }

    pub fn children<'a>(mut self, children: impl IntoIterator<Item = &'a Node>) -> Self {
        self.children.extend(children.into_iter().cloned());
        self
    }

    /// Bind external logic that [`Node::invoke`] will call.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Node) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Build using the process-wide id generator.
    pub fn build(self) -> Node {
        self.build_with(NodeIdGenerator::global())
    }

    /// Build using an explicitly owned id generator.
    pub fn build_with(self, generator: &NodeIdGenerator) -> Node {
        let id = generator.next_id();
        let label = self.label.unwrap_or_else(|| format!("node_{}", id.value()));
        Node {
            inner: Arc::new(NodeData {
                id,
                label,
                parents: self.parents,
                children: self.children,
                callback: self.callback,
            }),
        }
    }
}

/// Insertion-ordered set of nodes, keyed by node identity.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: IndexSet<Node>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node`. Returns false if it was already present.
    pub fn add(&mut self, node: Node) -> bool {
        self.nodes.insert(node)
    }

    /// Remove `node`, keeping the order of the rest. Absent nodes are ignored.
    pub fn remove(&mut self, node: &Node) -> bool {
        self.nodes.shift_remove(node)
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Position of `node` in insertion order.
    pub fn index_of(&self, node: &Node) -> Option<usize> {
        self.nodes.get_index_of(node)
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index)
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(Node::id).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(Node::label).collect()
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = &'a Node>>(iter: I) -> Self {
        iter.into_iter().cloned().collect()
    }
}

impl Extend<Node> for NodeSet {
    fn extend<I: IntoIterator<Item = Node>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

impl IntoIterator for NodeSet {
    type Item = Node;
    type IntoIter = indexmap::set::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a Node;
    type IntoIter = indexmap::set::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for NodeSet {
    /// `[Node 1, Node 2]`, or nothing at all when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return Ok(());
        }
        let parts: Vec<String> = self.nodes.iter().map(Node::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl fmt::Debug for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.nodes.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_label_uses_id() {
        let gen = NodeIdGenerator::starting_at(42);
        let node = Node::builder().build_with(&gen);
        assert_eq!(node.id(), NodeId(42));
        assert_eq!(node.label(), "node_42");
    }

    #[test]
    fn test_ids_increase() {
        let a = Node::new();
        let b = Node::new();
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_identity_not_label() {
        let a = Node::labeled("stage");
        let b = Node::labeled("stage");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let set: NodeSet = [a.clone(), b.clone(), a.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_construction_does_not_register_reverse_edges() {
        let parent = Node::labeled("parent");
        let child = Node::builder().label("child").parents([&parent]).build();

        assert!(child.parents().contains(&parent));
        assert!(parent.children().is_empty());
    }

    #[test]
    fn test_node_set_remove_keeps_order() {
        let nodes: Vec<Node> = (0..4).map(|_| Node::new()).collect();
        let mut set: NodeSet = nodes.iter().collect();
        assert!(set.remove(&nodes[1]));
        assert!(!set.remove(&nodes[1]));
        assert_eq!(set.ids(), vec![nodes[0].id(), nodes[2].id(), nodes[3].id()]);
    }

    #[test]
    fn test_node_set_display() {
        let gen = NodeIdGenerator::starting_at(1);
        let a = Node::builder().build_with(&gen);
        let b = Node::builder().build_with(&gen);
        let set: NodeSet = [&a, &b].into_iter().collect();
        assert_eq!(set.to_string(), "[Node 1, Node 2]");
        assert_eq!(NodeSet::new().to_string(), "");
    }

    #[test]
    fn test_describe_skips_empty_rows() {
        let gen = NodeIdGenerator::starting_at(10);
        let parent = Node::builder().build_with(&gen);
        let node = Node::builder().parents([&parent]).build_with(&gen);

        let text = node.describe();
        assert_eq!(text, "parents   [Node 10]\nself      Node 11");
    }

    #[test]
    fn test_invoke_runs_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let node = Node::builder()
            .label("tick")
            .callback(move |node| {
                assert_eq!(node.label(), "tick");
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        node.invoke().unwrap();
        node.invoke().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invoke_without_callback_is_noop() {
        let node = Node::new();
        assert!(!node.has_callback());
        assert!(node.invoke().is_ok());
    }
}
