//! Components: units of work that read one shared cell and write another.

pub mod cell;
pub mod role;
pub mod stage;

pub use cell::SharedCell;
pub use role::Role;
pub use stage::{Component, Extract, Handle, Lifecycle, Process, Stage};
