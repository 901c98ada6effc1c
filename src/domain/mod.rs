// Domain layer for fun-trace: source facts, resolution and traversal.

pub mod callgraph;
pub mod entry_point;
pub mod error;
pub mod model;
pub mod resolver;
pub mod trace;
