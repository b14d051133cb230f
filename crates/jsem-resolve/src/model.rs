//! The semantic model registry.
//!
//! The shared store written by the declaration pass and the type solver and
//! queried by rule checks. Forward and inverse relations are owned index
//! maps kept in sync by a single mutating operation each; nothing holds
//! back-pointers into the tree.
//!
//! All queries are total. Absence of data is `None` (or an empty slice) —
//! distinct from the unknown-symbol/unknown-type sentinels, which are
//! present-but-invalid values.

use jsem_ast::{NodeId, TreeArena};
use rustc_hash::FxHashMap;

use crate::env::{EnvArena, EnvId, Environment};
use crate::symbols::SymbolId;
use crate::types::TypeId;

/// Symbol, type, environment, and reference relations for one compilation
/// unit. Created fresh per file and discarded after that file's checks run.
#[derive(Debug, Default)]
pub struct SemanticModel {
    /// node → declared/denoted symbol, and its inverse. Bijective where
    /// populated: a node declares at most one symbol.
    symbol_of_node: FxHashMap<NodeId, SymbolId>,
    node_of_symbol: FxHashMap<SymbolId, NodeId>,

    /// symbol → referencing identifier nodes, and identifier → symbol.
    usages: FxHashMap<SymbolId, Vec<NodeId>>,
    refers_to: FxHashMap<NodeId, SymbolId>,

    env_of_symbol: FxHashMap<SymbolId, EnvId>,
    env_of_node: FxHashMap<NodeId, EnvId>,

    /// child → parent, arena-indexed. Built once before resolution begins,
    /// never mutated afterward; used only for environment lookup fallback.
    parent_link: Vec<NodeId>,

    /// node → type. Total after the solver's cleanup sweep.
    node_types: FxHashMap<NodeId, TypeId>,

    /// Environment storage, attached once the passes complete so consumers
    /// can inspect scopes.
    envs: EnvArena,
}

impl SemanticModel {
    pub fn new() -> SemanticModel {
        SemanticModel::default()
    }

    /// Build the immutable parent-link map with one full traversal.
    /// Acyclic by construction: links always point from child to an
    /// earlier-visited node.
    pub fn build_parent_links(&mut self, arena: &TreeArena, root: NodeId) {
        self.parent_link = vec![NodeId::NONE; arena.len()];
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            arena.for_each_child(node, |child| {
                self.parent_link[child.index()] = node;
                stack.push(child);
            });
        }
    }

    /// Immediate syntax parent, `NONE` for the root or unlinked nodes.
    pub fn parent(&self, node: NodeId) -> NodeId {
        self.parent_link
            .get(node.index())
            .copied()
            .unwrap_or(NodeId::NONE)
    }

    /// Record that `node` declares `symbol`, updating both directions.
    pub fn associate_symbol(&mut self, node: NodeId, symbol: SymbolId) {
        self.symbol_of_node.insert(node, symbol);
        self.node_of_symbol.insert(symbol, node);
    }

    pub fn symbol_at(&self, node: NodeId) -> Option<SymbolId> {
        self.symbol_of_node.get(&node).copied()
    }

    /// Declaration site of a symbol declared in this compilation unit.
    pub fn declaration_of(&self, symbol: SymbolId) -> Option<NodeId> {
        self.node_of_symbol.get(&symbol).copied()
    }

    /// Record that identifier `node` refers to `symbol`, updating the usage
    /// multiset and the refers-to map together so they stay consistent.
    pub fn associate_reference(&mut self, node: NodeId, symbol: SymbolId) {
        self.usages.entry(symbol).or_default().push(node);
        self.refers_to.insert(node, symbol);
    }

    pub fn reference_at(&self, node: NodeId) -> Option<SymbolId> {
        self.refers_to.get(&node).copied()
    }

    /// All identifier nodes referring to `symbol`.
    pub fn usages_of(&self, symbol: SymbolId) -> &[NodeId] {
        self.usages.get(&symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn save_symbol_env(&mut self, symbol: SymbolId, env: EnvId) {
        self.env_of_symbol.insert(symbol, env);
    }

    pub fn env_of_symbol(&self, symbol: SymbolId) -> Option<EnvId> {
        self.env_of_symbol.get(&symbol).copied()
    }

    /// Associate a scope-introducing node with its environment.
    pub fn associate_env(&mut self, node: NodeId, env: EnvId) {
        self.env_of_node.insert(node, env);
    }

    /// Environment active at `node`: the one associated with the nearest
    /// ancestor (or `node` itself) that introduces a scope. Every node is
    /// reachable by a finite upward walk.
    pub fn env_at(&self, node: NodeId) -> Option<EnvId> {
        let mut current = node;
        while !current.is_none() {
            if let Some(&env) = self.env_of_node.get(&current) {
                return Some(env);
            }
            current = self.parent(current);
        }
        None
    }

    pub fn register_type(&mut self, node: NodeId, type_id: TypeId) {
        self.node_types.insert(node, type_id);
    }

    pub fn type_at(&self, node: NodeId) -> Option<TypeId> {
        self.node_types.get(&node).copied()
    }

    /// Cleanup sweep: any node the solver did not explicitly visit gets the
    /// unknown type, guaranteeing totality of typing.
    pub fn assign_missing_types(&mut self, arena: &TreeArena, unknown_type: TypeId) {
        for id in arena.ids() {
            self.node_types.entry(id).or_insert(unknown_type);
        }
    }

    pub(crate) fn attach_envs(&mut self, envs: EnvArena) {
        self.envs = envs;
    }

    pub fn environment(&self, env: EnvId) -> Option<&Environment> {
        self.envs.try_get(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsem_ast::{NodeKind, TreeArena};
    use jsem_common::Span;

    fn small_tree() -> (TreeArena, NodeId, NodeId, NodeId) {
        let mut arena = TreeArena::new();
        let left = arena.add_identifier("a", Span::EMPTY);
        let right = arena.add_identifier("b", Span::EMPTY);
        let binary = arena.push(
            NodeKind::Binary {
                op: jsem_ast::BinaryOp::Plus,
                left,
                right,
            },
            Span::EMPTY,
        );
        (arena, binary, left, right)
    }

    #[test]
    fn parent_links_cover_all_children() {
        let (arena, root, left, right) = small_tree();
        let mut model = SemanticModel::new();
        model.build_parent_links(&arena, root);
        assert_eq!(model.parent(left), root);
        assert_eq!(model.parent(right), root);
        assert!(model.parent(root).is_none());
    }

    #[test]
    fn env_lookup_climbs_to_nearest_ancestor() {
        let (arena, root, left, _) = small_tree();
        let mut model = SemanticModel::new();
        model.build_parent_links(&arena, root);
        model.associate_env(root, EnvId(0));
        assert_eq!(model.env_at(left), Some(EnvId(0)));
        assert_eq!(model.env_at(root), Some(EnvId(0)));
    }

    #[test]
    fn references_stay_mutually_consistent() {
        let (_, _, left, right) = small_tree();
        let mut model = SemanticModel::new();
        let symbol = SymbolId(3);
        model.associate_reference(left, symbol);
        model.associate_reference(right, symbol);
        for &usage in model.usages_of(symbol) {
            assert_eq!(model.reference_at(usage), Some(symbol));
        }
        assert_eq!(model.usages_of(symbol).len(), 2);
    }

    #[test]
    fn absence_is_distinct_from_sentinels() {
        let model = SemanticModel::new();
        assert_eq!(model.symbol_at(NodeId(5)), None);
        assert_eq!(model.type_at(NodeId(5)), None);
        assert!(model.usages_of(SymbolId(5)).is_empty());
    }

    #[test]
    fn missing_type_sweep_makes_typing_total() {
        let (arena, root, _, _) = small_tree();
        let mut model = SemanticModel::new();
        let unknown = TypeId(0);
        model.register_type(root, TypeId(4));
        model.assign_missing_types(&arena, unknown);
        for id in arena.ids() {
            assert!(model.type_at(id).is_some());
        }
        // Explicitly registered types survive the sweep.
        assert_eq!(model.type_at(root), Some(TypeId(4)));
    }
}
