//! Semantic analysis for Java compilation units.
//!
//! Takes a syntax tree and produces a [`SemanticModel`]: a symbol for
//! every declaration, a reference for every resolved identifier, and a
//! type for every node. The passes run in a fixed order over one file:
//!
//! - [`FirstPass`] declares symbols and builds the environment tree.
//! - [`TypeSolver`] resolves references and types expressions.
//! - [`LabelsVisitor`] resolves statement labels in their own namespace.
//! - A cleanup sweep assigns the unknown type to every remaining node.
//!
//! [`Symbols`] and the [`BytecodeCompleter`] are shared across all files
//! of one analysis run; the model and its environments are per file.
//! Resolution never fails on bad input: unresolved names yield the run's
//! unknown symbol, untypeable expressions the unknown type. Only malformed
//! trees that violate parser guarantees abort with a [`SemanticError`].

mod completer;
mod env;
mod error;
mod first_pass;
mod labels;
mod model;
mod resolve;
mod symbols;
mod type_solver;
mod types;

pub use completer::{
    BytecodeCompleter, ClassMetadata, DirectorySource, FieldMetadata, MetadataSource,
    MethodMetadata,
};
pub use env::{EnvArena, EnvId, Environment};
pub use error::SemanticError;
pub use first_pass::FirstPass;
pub use labels::LabelsVisitor;
pub use model::SemanticModel;
pub use resolve::Resolver;
pub use symbols::{Symbol, SymbolArena, SymbolFilter, SymbolId, SymbolKind, Symbols};
pub use type_solver::TypeSolver;
pub use types::{Type, TypeArena, TypeId, TypeTag};

use jsem_ast::{NodeId, TreeArena};

/// Analyze one compilation unit.
///
/// `symbols` and `completer` carry state across the files of a run;
/// everything else is created here. On success the returned model answers
/// every symbol, reference, environment, and type query for this tree.
pub fn create_semantic_model(
    arena: &TreeArena,
    unit: NodeId,
    symbols: &mut Symbols,
    completer: &mut BytecodeCompleter,
) -> Result<SemanticModel, SemanticError> {
    let mut model = SemanticModel::new();
    let mut envs = EnvArena::new();
    model.build_parent_links(arena, unit);

    FirstPass::new(arena, symbols, &mut envs, &mut model).run(unit)?;
    let solved = TypeSolver::new(arena, symbols, &envs, completer, &mut model).solve(unit);
    if solved.is_ok() {
        LabelsVisitor::new(arena, symbols, &mut model).run(unit);
    }
    // Runs even when the solver bailed out, so partial models stay total.
    model.assign_missing_types(arena, symbols.unknown_type);
    model.attach_envs(envs);
    solved?;
    Ok(model)
}
