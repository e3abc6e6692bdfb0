//! Managers: containers that wire components together and run them.
//!
//! - [`SerialManager`] runs components in order, feeding each one the
//!   previous one's outputs.
//! - [`ParallelManager`] runs components concurrently on one shared input.
//! - [`Pipeline`] is a serial manager with extractor, processor and handler
//!   slots.

pub mod list;
pub mod parallel;
pub mod pipeline;
pub mod serial;

pub use list::{BoxedComponent, ComponentList};
pub use parallel::ParallelManager;
pub use pipeline::Pipeline;
pub use serial::SerialManager;
