//! # stagegraph: directed-graph orchestration for data stages
//!
//! Build a directed graph of processing stages, check it for cycles, and run
//! extract → process → handle pipelines serially or in parallel. Stages pass
//! data by aliasing each other's input/output cells rather than copying.
//!
//! ## Architecture
//!
//! - **Graph**: [`Node`] handles, a [`DiGraph`] of node → children edges and
//!   the [`NodeMapping`] adjacency view used for cycle detection
//! - **Components**: [`Stage`] wraps one [`Extract`], [`Process`] or
//!   [`Handle`] capability and owns [`SharedCell`] inputs/outputs
//! - **Managers**: [`SerialManager`], [`ParallelManager`] and the three-slot
//!   [`Pipeline`]; serial managers and pipelines nest as components
//! - **Ambient**: [`config::EngineConfig`], [`logging::init`] and the
//!   [`StageGraphError`] type shared by everything
//!
//! ## Example
//!
//! ```ignore
//! use stagegraph::{Pipeline, Stage};
//!
//! let mut pipeline = Pipeline::new(
//!     "etl",
//!     Stage::extract_fn("read", |path: &String| Ok(std::fs::read_to_string(path)?)),
//!     Stage::process_fn("trim", |s: &String| Ok(s.trim().to_string())),
//!     Stage::handle_fn("print", |s: &String| {
//!         println!("{s}");
//!         Ok(s.clone())
//!     }),
//! )?;
//! let out = pipeline.run_with("input.txt".to_string())?;
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod manager;

// Re-export commonly used types
pub use component::{Component, Extract, Handle, Lifecycle, Process, Role, SharedCell, Stage};
pub use config::EngineConfig;
pub use error::{Result, ResultExt, StageGraphError};
pub use graph::{CycleStrategy, DiGraph, Node, NodeBuilder, NodeId, NodeMapping, NodeSet};
pub use manager::{ComponentList, ParallelManager, Pipeline, SerialManager};
