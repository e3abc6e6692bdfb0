//! Error handling for stagegraph
//!
//! This module defines the crate-wide error type and a Result alias.
//! Graph-structural errors (`CycleDetected`, `UnknownNode`) are returned to
//! whoever performed the query or mutation; `ComponentFailure` carries the
//! failing stage's name and the error its capability reported.

use crate::component::Role;
use crate::graph::{Node, NodeSet};
use thiserror::Error;

/// Main error type for stagegraph operations
#[derive(Error, Debug)]
pub enum StageGraphError {
    /// The graph contains at least one cycle where acyclicity is required
    #[error("Cycle detected among nodes {nodes}")]
    CycleDetected { nodes: NodeSet },

    /// A component without the required role was assigned to a pipeline slot
    #[error("Capability mismatch for {slot} slot: expected {expected}, found {found}")]
    CapabilityMismatch {
        slot: &'static str,
        expected: Role,
        found: Role,
    },

    /// A shared cell was read before it was set or aliased
    #[error("Shared cell read before it was bound to a value")]
    UnboundReference,

    /// A node was queried that the graph does not know about
    #[error("Unknown node: {node} ('{}')", .node.label())]
    UnknownNode { node: Node },

    /// A component's run (or configure) step failed
    #[error("Component '{component}' failed: {source}")]
    ComponentFailure {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to tracing subscriber setup
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StageGraphError>,
    },
}

impl StageGraphError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StageGraphError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Wrap a capability error as a failure of the named component
    pub fn component(component: impl Into<String>, source: anyhow::Error) -> Self {
        StageGraphError::ComponentFailure {
            component: component.into(),
            source,
        }
    }

    /// Strip any `WithContext` layers and return the underlying error
    pub fn root(&self) -> &StageGraphError {
        match self {
            StageGraphError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for stagegraph operations
pub type Result<T> = std::result::Result<T, StageGraphError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| StageGraphError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| StageGraphError::Io(e).with_context(f()))
    }
}
