//! Fatal analysis failures.
//!
//! Only internal invariant violations land here: a tree shape the parser
//! guarantees impossible. They abort analysis of the current file, and the
//! run continues with the next one. Soft failures (unresolved names,
//! missing library classes, malformed declarations) never reach this type;
//! they are represented as erroneous-tier symbol and type values.

use jsem_ast::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("syntax tree root {0:?} is not a compilation unit")]
    NotACompilationUnit(NodeId),

    #[error("malformed syntax tree at {node:?}: {message}")]
    MalformedTree { node: NodeId, message: String },

    #[error("no environment reachable from {0:?}")]
    MissingEnvironment(NodeId),
}

impl SemanticError {
    pub fn malformed(node: NodeId, message: impl Into<String>) -> SemanticError {
        SemanticError::MalformedTree {
            node,
            message: message.into(),
        }
    }
}
