//! Syntax tree model for the jsem Java analyzer.
//!
//! The analyzer does not parse source text; it consumes an already-built
//! tree. This crate defines that tree:
//! - `TreeArena`: arena storage, every node addressed by a stable `NodeId`
//! - `NodeKind`: a closed tagged-variant enum of every modeled construct
//!
//! Constructs the analyzer does not model arrive as `NodeKind::Other` and
//! are still typed (as unknown) by the semantic phase.

pub mod arena;
pub mod node;

pub use arena::{NodeData, TreeArena};
pub use node::{BinaryOp, ClassKind, LiteralKind, NodeId, NodeKind, UnaryOp};
