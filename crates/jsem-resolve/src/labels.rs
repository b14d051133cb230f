//! Statement label resolution.
//!
//! Labels live in their own namespace: a label and a variable of the same
//! name never interfere, so labels get a dedicated pass after type
//! resolution. A labeled statement declares a symbol; a `break` or
//! `continue` naming a label refers to the innermost enclosing declaration
//! of that name.

use jsem_ast::{NodeId, NodeKind, TreeArena};
use tracing::debug;

use crate::model::SemanticModel;
use crate::symbols::{Symbol, SymbolId, SymbolKind, Symbols};

pub struct LabelsVisitor<'a> {
    arena: &'a TreeArena,
    symbols: &'a mut Symbols,
    model: &'a mut SemanticModel,
    /// Innermost label last.
    labels: Vec<(String, SymbolId)>,
}

impl<'a> LabelsVisitor<'a> {
    pub fn new(
        arena: &'a TreeArena,
        symbols: &'a mut Symbols,
        model: &'a mut SemanticModel,
    ) -> LabelsVisitor<'a> {
        LabelsVisitor {
            arena,
            symbols,
            model,
            labels: Vec::new(),
        }
    }

    pub fn run(mut self, unit: NodeId) {
        self.scan(unit);
    }

    fn scan(&mut self, node: NodeId) {
        let arena = self.arena;
        let Some(data) = arena.get(node) else {
            return;
        };
        match &data.kind {
            NodeKind::LabeledStatement { label, statement } => {
                let symbol = self
                    .symbols
                    .arena
                    .alloc(Symbol::new(SymbolKind::Variable, label.as_str(), SymbolId::NONE));
                self.model.associate_symbol(node, symbol);
                self.labels.push((label.clone(), symbol));
                self.scan(*statement);
                self.labels.pop();
            }
            NodeKind::Break { label: Some(label) } | NodeKind::Continue { label: Some(label) } => {
                match self.innermost(label) {
                    Some(symbol) => self.model.associate_reference(node, symbol),
                    None => debug!(label = %label, node = ?node, "unresolved label"),
                }
            }
            // A labeled jump cannot cross a class boundary; a nested class
            // body starts from an empty label stack.
            NodeKind::ClassDeclaration { members, .. } => {
                let saved = std::mem::take(&mut self.labels);
                for &member in members {
                    self.scan(member);
                }
                self.labels = saved;
            }
            _ => {
                for child in arena.children(node) {
                    self.scan(child);
                }
            }
        }
    }

    fn innermost(&self, label: &str) -> Option<SymbolId> {
        self.labels
            .iter()
            .rev()
            .find(|(name, _)| name == label)
            .map(|&(_, symbol)| symbol)
    }
}
