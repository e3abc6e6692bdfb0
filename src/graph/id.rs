//! Identity types for graph nodes.
//!
//! Node ids are handed out by a [`NodeIdGenerator`]. Most callers use the
//! process-wide generator behind [`NodeIdGenerator::global`]; a graph builder
//! that wants its own numbering can own a generator and pass it to
//! [`NodeBuilder::build_with`](crate::graph::NodeBuilder::build_with).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic node number. Used for display and default labels; node identity
/// itself is the node handle, not this number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u64);

impl NodeId {
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out strictly increasing [`NodeId`]s. Safe to share between threads.
#[derive(Debug, Default)]
pub struct NodeIdGenerator {
    next: AtomicU64,
}

static GLOBAL_GENERATOR: NodeIdGenerator = NodeIdGenerator::new();

impl NodeIdGenerator {
    /// Create a generator whose first id is 0.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Create a generator whose first id is `start`.
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// The process-wide generator used by [`Node::new`](crate::graph::Node::new).
    pub fn global() -> &'static NodeIdGenerator {
        &GLOBAL_GENERATOR
    }

    /// Take the next id.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> NodeId {
        NodeId(self.next.load(Ordering::Relaxed))
    }
}
