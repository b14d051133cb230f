//! Declaration pass.
//!
//! One traversal over the tree, in declaration order, creating a symbol for
//! every type, method, field, parameter, local, and enum constant, and an
//! environment at every scope-introducing node. It completes before any
//! resolution happens, which is what makes forward references within the
//! same compilation unit work.
//!
//! A locally malformed declaration registers an erroneous symbol at that
//! node and continues; it never aborts the pass.

use jsem_ast::{NodeId, NodeKind, TreeArena};
use tracing::{debug, warn};

use crate::env::{EnvArena, EnvId, Environment};
use crate::error::SemanticError;
use crate::model::SemanticModel;
use crate::symbols::{Symbol, SymbolId, SymbolKind, Symbols};
use crate::types::Type;

pub struct FirstPass<'a> {
    arena: &'a TreeArena,
    symbols: &'a mut Symbols,
    envs: &'a mut EnvArena,
    model: &'a mut SemanticModel,
    env: EnvId,
}

impl<'a> FirstPass<'a> {
    pub fn new(
        arena: &'a TreeArena,
        symbols: &'a mut Symbols,
        envs: &'a mut EnvArena,
        model: &'a mut SemanticModel,
    ) -> FirstPass<'a> {
        FirstPass {
            arena,
            symbols,
            envs,
            model,
            env: EnvId::NONE,
        }
    }

    pub fn run(mut self, unit: NodeId) -> Result<(), SemanticError> {
        let arena = self.arena;
        let NodeKind::CompilationUnit {
            package,
            imports,
            types,
        } = arena.kind(unit)
        else {
            return Err(SemanticError::NotACompilationUnit(unit));
        };

        let package_symbol = match package {
            Some(decl) => match arena.kind(*decl) {
                NodeKind::PackageDeclaration { name } => match self.flatten_name(*name) {
                    Some(fqn) => self.symbols.enter_package(&fqn),
                    None => {
                        warn!(node = ?decl, "unresolvable package name, using default package");
                        self.symbols.default_package
                    }
                },
                _ => {
                    warn!(node = ?decl, "malformed package declaration");
                    self.symbols.default_package
                }
            },
            None => self.symbols.default_package,
        };

        let unit_env = self.envs.alloc(Environment::compilation_unit(package_symbol));
        for &import in imports {
            match arena.kind(import) {
                NodeKind::Import {
                    qualified,
                    is_static,
                    on_demand,
                } => match self.flatten_name(*qualified) {
                    Some(fqn) => {
                        if *is_static {
                            // Static imports go through the same scopes as
                            // type imports; the imported member is found by
                            // name like any other.
                            debug!(%fqn, "static import treated as a type import");
                        }
                        if *on_demand {
                            self.envs.get_mut(unit_env).star_imports.push(fqn);
                        } else {
                            self.envs.get_mut(unit_env).named_imports.push(fqn);
                        }
                    }
                    None => warn!(node = ?import, "unresolvable import, skipped"),
                },
                _ => {
                    warn!(node = ?import, "malformed import declaration");
                    let erroneous = self.symbols.enter_erroneous();
                    self.model.associate_symbol(import, erroneous);
                }
            }
        }
        self.model.associate_env(unit, unit_env);
        self.env = unit_env;

        for &type_decl in types {
            self.declare_type(type_decl);
        }
        Ok(())
    }

    /// Dotted name of an identifier or member-select chain.
    fn flatten_name(&self, node: NodeId) -> Option<String> {
        match self.arena.get(node).map(|data| &data.kind)? {
            NodeKind::Identifier { name } => Some(name.clone()),
            NodeKind::MemberSelect {
                expression,
                identifier,
            } => {
                let prefix = self.flatten_name(*expression)?;
                let name = self.arena.identifier_name(*identifier)?;
                Some(format!("{prefix}.{name}"))
            }
            _ => None,
        }
    }

    /// Owner for a symbol declared in the current environment.
    fn current_owner(&self) -> SymbolId {
        let env = self.envs.get(self.env);
        if !env.enclosing_method.is_none() {
            env.enclosing_method
        } else if !env.enclosing_class.is_none() {
            env.enclosing_class
        } else {
            env.package_symbol
        }
    }

    fn declare_erroneous(&mut self, node: NodeId) {
        let erroneous = self.symbols.enter_erroneous();
        self.model.associate_symbol(node, erroneous);
    }

    fn declare_type(&mut self, node: NodeId) {
        let arena = self.arena;
        let NodeKind::ClassDeclaration { name, members, .. } = arena.kind(node) else {
            warn!(node = ?node, "expected a type declaration");
            self.declare_erroneous(node);
            return;
        };

        let owner = self.current_owner();
        let symbol = self.symbols.arena.alloc(Symbol::new(SymbolKind::Type, name.as_str(), owner));
        let type_id = self.symbols.types.alloc(Type::class(symbol));
        self.symbols.arena.get_mut(symbol).type_id = type_id;
        let owner_kind = self.symbols.arena.get(owner).kind;
        if matches!(owner_kind, SymbolKind::Package | SymbolKind::Type) {
            self.symbols.arena.get_mut(owner).members.push(symbol);
        }

        self.model.associate_symbol(node, symbol);
        self.model.save_symbol_env(symbol, self.env);
        self.envs.get_mut(self.env).scope.push(symbol);

        let class_env = self.envs.nested(self.env);
        self.envs.get_mut(class_env).enclosing_class = symbol;
        self.envs.get_mut(class_env).enclosing_method = SymbolId::NONE;
        self.model.associate_env(node, class_env);

        let saved = self.env;
        self.env = class_env;
        for &member in members {
            match arena.kind(member) {
                NodeKind::Variable { .. } => self.declare_field(member, symbol),
                NodeKind::MethodDeclaration { .. } => self.declare_method(member, symbol),
                NodeKind::ClassDeclaration { .. } => self.declare_type(member),
                NodeKind::EnumConstant { .. } => self.declare_enum_constant(member, symbol),
                NodeKind::Block { .. } => self.scan(member),
                _ => {
                    warn!(node = ?member, "malformed class member");
                    self.declare_erroneous(member);
                }
            }
        }
        self.env = saved;
    }

    fn declare_field(&mut self, node: NodeId, class: SymbolId) {
        let arena = self.arena;
        let NodeKind::Variable {
            name,
            var_type,
            initializer,
        } = arena.kind(node)
        else {
            self.declare_erroneous(node);
            return;
        };
        if arena.get(*var_type).is_none() {
            warn!(node = ?node, field = %name, "field declaration without a type");
            self.declare_erroneous(node);
            return;
        }
        let symbol = self
            .symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, name.as_str(), class));
        self.model.associate_symbol(node, symbol);
        self.model.save_symbol_env(symbol, self.env);
        self.symbols.arena.get_mut(class).members.push(symbol);
        self.envs.get_mut(self.env).scope.push(symbol);
        if let Some(initializer) = initializer {
            self.scan(*initializer);
        }
    }

    fn declare_method(&mut self, node: NodeId, class: SymbolId) {
        let arena = self.arena;
        let NodeKind::MethodDeclaration {
            name,
            parameters,
            body,
            ..
        } = arena.kind(node)
        else {
            self.declare_erroneous(node);
            return;
        };
        let symbol = self
            .symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Method, name.as_str(), class));
        self.model.associate_symbol(node, symbol);
        self.model.save_symbol_env(symbol, self.env);
        self.symbols.arena.get_mut(class).members.push(symbol);
        self.envs.get_mut(self.env).scope.push(symbol);

        let method_env = self.envs.nested(self.env);
        self.envs.get_mut(method_env).enclosing_method = symbol;
        self.model.associate_env(node, method_env);

        let saved = self.env;
        self.env = method_env;
        for &parameter in parameters {
            match arena.kind(parameter) {
                NodeKind::Variable { .. } => self.declare_local(parameter),
                _ => {
                    warn!(node = ?parameter, "malformed parameter declaration");
                    self.declare_erroneous(parameter);
                }
            }
        }
        if let Some(body) = body {
            self.scan(*body);
        }
        self.env = saved;
    }

    fn declare_enum_constant(&mut self, node: NodeId, class: SymbolId) {
        let arena = self.arena;
        let NodeKind::EnumConstant { name, initializer } = arena.kind(node) else {
            self.declare_erroneous(node);
            return;
        };
        let symbol = self
            .symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, name.as_str(), class));
        // An enum constant is typed as its enum.
        self.symbols.arena.get_mut(symbol).type_id = self.symbols.arena.get(class).type_id;
        self.model.associate_symbol(node, symbol);
        self.model.save_symbol_env(symbol, self.env);
        self.symbols.arena.get_mut(class).members.push(symbol);
        self.envs.get_mut(self.env).scope.push(symbol);
        self.scan(*initializer);
    }

    fn declare_local(&mut self, node: NodeId) {
        let arena = self.arena;
        let NodeKind::Variable {
            name,
            var_type,
            initializer,
        } = arena.kind(node)
        else {
            self.declare_erroneous(node);
            return;
        };
        if arena.get(*var_type).is_none() {
            warn!(node = ?node, local = %name, "variable declaration without a type");
            self.declare_erroneous(node);
            return;
        }
        let owner = self.current_owner();
        let symbol = self
            .symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, name.as_str(), owner));
        self.model.associate_symbol(node, symbol);
        self.model.save_symbol_env(symbol, self.env);
        self.envs.get_mut(self.env).scope.push(symbol);
        if let Some(initializer) = initializer {
            self.scan(*initializer);
        }
    }

    fn scan_in_new_env(&mut self, node: NodeId, children: &[NodeId]) {
        let scope_env = self.envs.nested(self.env);
        self.model.associate_env(node, scope_env);
        let saved = self.env;
        self.env = scope_env;
        for &child in children {
            self.scan(child);
        }
        self.env = saved;
    }

    /// Generic walk over statements and expressions, declaring the
    /// constructs that can appear there: locals, local classes, anonymous
    /// class bodies, and the scopes of blocks, loops, and catch clauses.
    fn scan(&mut self, node: NodeId) {
        let arena = self.arena;
        let Some(data) = arena.get(node) else {
            return;
        };
        match &data.kind {
            NodeKind::ClassDeclaration { .. } => self.declare_type(node),
            NodeKind::Variable { .. } => self.declare_local(node),
            NodeKind::Block { statements } => self.scan_in_new_env(node, statements),
            NodeKind::For { .. } | NodeKind::ForEach { .. } | NodeKind::Catch { .. } => {
                let children = arena.children(node);
                self.scan_in_new_env(node, &children);
            }
            NodeKind::NewClass {
                arguments,
                class_body,
                ..
            } => {
                for &argument in arguments {
                    self.scan(argument);
                }
                if let Some(body) = class_body {
                    self.declare_type(*body);
                }
            }
            NodeKind::MethodDeclaration { .. } | NodeKind::EnumConstant { .. } => {
                warn!(node = ?node, "declaration outside of a class body");
                self.declare_erroneous(node);
            }
            _ => {
                let children = arena.children(node);
                for child in children {
                    self.scan(child);
                }
            }
        }
    }
}
