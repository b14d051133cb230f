//! Reference resolution and expression typing.
//!
//! Runs after the declaration pass, in two steps. A declaration-completion
//! step resolves every class's heritage and every field and method
//! signature first, so expression typing never observes a half-built
//! declaration regardless of declaration order. The main traversal then
//! dispatches exhaustively on node kind, records a reference for every
//! resolved identifier, and registers a type for every expression it
//! understands. Nodes it does not understand get the unknown type, here or
//! in the driver's cleanup sweep.
//!
//! Deliberate approximations, kept for predictability over precision:
//! method lookup is by name only, and a conditional expression is typed
//! unknown rather than computing a least upper bound of its branches.

use jsem_ast::{LiteralKind, NodeId, NodeKind, TreeArena};
use tracing::debug;

use crate::completer::BytecodeCompleter;
use crate::env::{EnvArena, EnvId};
use crate::error::SemanticError;
use crate::model::SemanticModel;
use crate::resolve::Resolver;
use crate::symbols::{SymbolFilter, SymbolId, SymbolKind, Symbols};
use crate::types::{Type, TypeId, TypeTag};

pub struct TypeSolver<'a> {
    arena: &'a TreeArena,
    symbols: &'a mut Symbols,
    envs: &'a EnvArena,
    completer: &'a mut BytecodeCompleter,
    model: &'a mut SemanticModel,
}

impl<'a> TypeSolver<'a> {
    pub fn new(
        arena: &'a TreeArena,
        symbols: &'a mut Symbols,
        envs: &'a EnvArena,
        completer: &'a mut BytecodeCompleter,
        model: &'a mut SemanticModel,
    ) -> TypeSolver<'a> {
        TypeSolver {
            arena,
            symbols,
            envs,
            completer,
            model,
        }
    }

    fn resolver(&mut self) -> Resolver<'_> {
        Resolver {
            symbols: &mut *self.symbols,
            envs: &*self.envs,
            completer: &mut *self.completer,
        }
    }

    pub fn solve(&mut self, unit: NodeId) -> Result<(), SemanticError> {
        debug!(unit = ?unit, "typing compilation unit");
        self.complete_declarations()?;
        self.scan(unit)
    }

    /// Resolve class heritage and member signatures before any expression
    /// is typed. Symbols were all created by the declaration pass, so a
    /// field of type `B` resolves even when `B` is declared further down
    /// the file.
    fn complete_declarations(&mut self) -> Result<(), SemanticError> {
        let arena = self.arena;
        for node in arena.ids() {
            let Some(data) = arena.get(node) else { continue };
            match &data.kind {
                NodeKind::ClassDeclaration {
                    superclass,
                    interfaces,
                    ..
                } => {
                    let Some(symbol) = self.model.symbol_at(node) else { continue };
                    if self.symbols.arena.get(symbol).is_erroneous() {
                        continue;
                    }
                    let class_type = self.symbols.arena.get(symbol).type_id;
                    let supertype = match superclass {
                        Some(extended) => self.resolve_type(*extended)?,
                        // Without an extends clause member lookup still
                        // falls through to Object.
                        None => self.symbols.object_type,
                    };
                    let supertype = if supertype == class_type {
                        self.symbols.unknown_type
                    } else {
                        supertype
                    };
                    self.symbols.types.get_mut(class_type).supertype = supertype;
                    let mut implemented = Vec::with_capacity(interfaces.len());
                    for &interface in interfaces {
                        implemented.push(self.resolve_type(interface)?);
                    }
                    self.symbols.types.get_mut(class_type).interfaces = implemented;
                }
                NodeKind::MethodDeclaration {
                    return_type,
                    parameters,
                    ..
                } => {
                    let Some(symbol) = self.model.symbol_at(node) else { continue };
                    if self.symbols.arena.get(symbol).is_erroneous()
                        || !self.symbols.arena.get(symbol).type_id.is_none()
                    {
                        continue;
                    }
                    let result = match return_type {
                        Some(returned) => self.resolve_type(*returned)?,
                        // Constructors.
                        None => self.symbols.void_type,
                    };
                    let mut parameter_types = Vec::with_capacity(parameters.len());
                    for &parameter in parameters {
                        let declared = match arena.get(parameter).map(|d| &d.kind) {
                            Some(NodeKind::Variable { var_type, .. }) => {
                                self.resolve_type(*var_type)?
                            }
                            _ => self.symbols.unknown_type,
                        };
                        parameter_types.push(declared);
                    }
                    let signature = self.symbols.types.alloc(Type::method(parameter_types, result));
                    self.symbols.arena.get_mut(symbol).type_id = signature;
                }
                NodeKind::Variable { var_type, .. } => {
                    let Some(symbol) = self.model.symbol_at(node) else { continue };
                    if self.symbols.arena.get(symbol).is_erroneous()
                        || !self.symbols.arena.get(symbol).type_id.is_none()
                    {
                        continue;
                    }
                    let declared = self.resolve_type(*var_type)?;
                    self.symbols.arena.get_mut(symbol).type_id = declared;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Type registered for a node the solver already visited; unknown for
    /// anything else.
    fn type_of_node(&self, node: NodeId) -> TypeId {
        self.model.type_at(node).unwrap_or(self.symbols.unknown_type)
    }

    fn env_at(&self, node: NodeId) -> Result<EnvId, SemanticError> {
        self.model
            .env_at(node)
            .ok_or(SemanticError::MissingEnvironment(node))
    }

    /// Type denoted by a type-position node: primitive keyword, class
    /// reference, array, or a parameterized type erased to its raw type.
    ///
    /// Idempotent: a node reached both by signature completion and by the
    /// main traversal is resolved once, so its references are recorded
    /// once.
    fn resolve_type(&mut self, node: NodeId) -> Result<TypeId, SemanticError> {
        if let Some(existing) = self.model.type_at(node) {
            return Ok(existing);
        }
        let arena = self.arena;
        let Some(data) = arena.get(node) else {
            return Ok(self.symbols.unknown_type);
        };
        let resolved = match &data.kind {
            NodeKind::PrimitiveType { keyword } => self
                .symbols
                .primitive_by_name(keyword)
                .unwrap_or(self.symbols.unknown_type),
            NodeKind::ArrayType { element } => {
                let element_type = self.resolve_type(*element)?;
                let array_class = self.symbols.array_class;
                self.symbols.types.alloc(Type::array(element_type, array_class))
            }
            NodeKind::ParameterizedType { raw, arguments } => {
                // Type arguments are resolved for their references, then
                // erased: the node is typed as its raw type.
                for &argument in arguments {
                    self.resolve_type(argument)?;
                }
                self.resolve_type(*raw)?
            }
            NodeKind::Identifier { .. } | NodeKind::MemberSelect { .. } => {
                let symbol = self.resolve_as(node, SymbolFilter::TYPE)?;
                self.symbols.type_of(symbol)
            }
            _ => self.symbols.unknown_type,
        };
        self.model.register_type(node, resolved);
        Ok(resolved)
    }

    /// Whether a resolved symbol is worth a usage record. Packages
    /// materialized speculatively while walking a qualified name start out
    /// empty; a reference to one says nothing about the source, so only
    /// packages with contents are recorded.
    fn records_reference(&self, symbol: SymbolId) -> bool {
        let sym = self.symbols.arena.get(symbol);
        if sym.is_erroneous() {
            return false;
        }
        sym.kind != SymbolKind::Package || !sym.members.is_empty()
    }

    /// Resolve an identifier or member select against a kind filter,
    /// recording the reference and the node's type. Qualifiers of a select
    /// are resolved with a broadened filter, since a package, a type, or a
    /// variable can all qualify a further selection.
    fn resolve_as(&mut self, node: NodeId, filter: SymbolFilter) -> Result<SymbolId, SemanticError> {
        let arena = self.arena;
        let Some(data) = arena.get(node) else {
            return Ok(self.symbols.unknown_symbol);
        };
        match &data.kind {
            NodeKind::Identifier { name } => {
                let env = self.env_at(node)?;
                let found = {
                    let mut resolver = self.resolver();
                    resolver.find_ident(env, name, filter)
                };
                if self.records_reference(found) {
                    self.model.associate_reference(node, found);
                }
                let resolved = self.symbols.type_of(found);
                self.model.register_type(node, resolved);
                Ok(found)
            }
            NodeKind::MemberSelect {
                expression,
                identifier,
            } => {
                let Some(name) = arena.identifier_name(*identifier) else {
                    return Err(SemanticError::malformed(
                        *identifier,
                        "member select without a selected name",
                    ));
                };

                if name == "class" {
                    // `X.class` is a Class value whatever X is.
                    self.resolve_as(*expression, SymbolFilter::TYPE)?;
                    let class_type = self.symbols.class_type;
                    self.model.register_type(*identifier, class_type);
                    self.model.register_type(node, class_type);
                    return Ok(self.symbols.types.get(class_type).symbol);
                }

                let qualifier = self.resolve_as(
                    *expression,
                    SymbolFilter::PACKAGE | SymbolFilter::TYPE | SymbolFilter::VARIABLE,
                )?;
                let found = if self.symbols.arena.get(qualifier).kind == SymbolKind::Package {
                    let mut resolver = self.resolver();
                    resolver.find_ident_in_package(qualifier, name, filter)
                } else {
                    let site = self.symbols.type_of(qualifier);
                    // A select on a type also sees its nested types.
                    let mut resolver = self.resolver();
                    resolver.find_member(site, name, filter | SymbolFilter::TYPE)
                };
                if self.records_reference(found) {
                    self.model.associate_reference(*identifier, found);
                }
                let resolved = self.symbols.type_of(found);
                self.model.register_type(*identifier, resolved);
                self.model.register_type(node, resolved);
                Ok(found)
            }
            // Any other qualifier (an invocation, an array access, a cast)
            // contributes only its type.
            _ => {
                self.scan(node)?;
                let resolved = self.type_of_node(node);
                let ty = self.symbols.types.get(resolved);
                let symbol = match ty.tag {
                    TypeTag::Class | TypeTag::Array | TypeTag::Primitive => ty.symbol,
                    _ => self.symbols.unknown_symbol,
                };
                Ok(symbol)
            }
        }
    }

    fn scan(&mut self, node: NodeId) -> Result<(), SemanticError> {
        let arena = self.arena;
        let Some(data) = arena.get(node) else {
            return Ok(());
        };
        match &data.kind {
            NodeKind::CompilationUnit { types, .. } => {
                for &type_decl in types {
                    self.scan(type_decl)?;
                }
            }
            NodeKind::PackageDeclaration { .. } | NodeKind::Import { .. } => {}

            NodeKind::ClassDeclaration { members, .. } => {
                if let Some(symbol) = self.model.symbol_at(node) {
                    let class_type = self.symbols.type_of(symbol);
                    self.model.register_type(node, class_type);
                }
                for &member in members {
                    self.scan(member)?;
                }
            }
            NodeKind::MethodDeclaration {
                parameters,
                throws,
                body,
                ..
            } => {
                if let Some(symbol) = self.model.symbol_at(node) {
                    let signature = self.symbols.type_of(symbol);
                    self.model.register_type(node, signature);
                }
                for &parameter in parameters {
                    self.scan(parameter)?;
                }
                for &thrown in throws {
                    if self.model.type_at(thrown).is_none() {
                        self.resolve_type(thrown)?;
                    }
                }
                if let Some(body) = body {
                    self.scan(*body)?;
                }
            }
            NodeKind::Variable {
                var_type,
                initializer,
                ..
            } => {
                // Signature completion usually got here first.
                if self.model.type_at(*var_type).is_none() {
                    self.resolve_type(*var_type)?;
                }
                let declared = self.type_of_node(*var_type);
                if let Some(symbol) = self.model.symbol_at(node)
                    && self.symbols.arena.get(symbol).type_id.is_none()
                {
                    self.symbols.arena.get_mut(symbol).type_id = declared;
                }
                if let Some(initializer) = initializer {
                    self.scan(*initializer)?;
                }
                self.model.register_type(node, declared);
            }
            NodeKind::EnumConstant { initializer, .. } => {
                self.scan(*initializer)?;
                if let Some(symbol) = self.model.symbol_at(node) {
                    let constant_type = self.symbols.type_of(symbol);
                    self.model.register_type(node, constant_type);
                }
            }

            NodeKind::Block { statements } => {
                for &statement in statements {
                    self.scan(statement)?;
                }
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.scan(*condition)?;
                self.scan(*then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.scan(*else_branch)?;
                }
            }
            NodeKind::While { condition, body } => {
                self.scan(*condition)?;
                self.scan(*body)?;
            }
            NodeKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                for &statement in initializer {
                    self.scan(statement)?;
                }
                if let Some(condition) = condition {
                    self.scan(*condition)?;
                }
                for &statement in update {
                    self.scan(statement)?;
                }
                self.scan(*body)?;
            }
            NodeKind::ForEach {
                variable,
                expression,
                body,
            } => {
                self.scan(*variable)?;
                self.scan(*expression)?;
                self.scan(*body)?;
            }
            NodeKind::Return { expression } => {
                if let Some(expression) = expression {
                    self.scan(*expression)?;
                }
            }
            NodeKind::Throw { expression } => self.scan(*expression)?,
            NodeKind::Try {
                block,
                catches,
                finally_block,
            } => {
                self.scan(*block)?;
                for &catch in catches {
                    self.scan(catch)?;
                }
                if let Some(finally_block) = finally_block {
                    self.scan(*finally_block)?;
                }
            }
            NodeKind::Catch { parameter, block } => {
                self.scan(*parameter)?;
                self.scan(*block)?;
            }
            NodeKind::ExpressionStatement { expression } => {
                self.scan(*expression)?;
                let inner = self.type_of_node(*expression);
                self.model.register_type(node, inner);
            }
            NodeKind::LabeledStatement { statement, .. } => self.scan(*statement)?,
            NodeKind::Break { .. } | NodeKind::Continue { .. } => {}

            NodeKind::Identifier { .. } => {
                self.resolve_as(node, SymbolFilter::VARIABLE)?;
            }
            NodeKind::MemberSelect { .. } => {
                self.resolve_as(node, SymbolFilter::VARIABLE | SymbolFilter::TYPE)?;
            }
            NodeKind::MethodInvocation {
                method_select,
                arguments,
            } => {
                for &argument in arguments {
                    self.scan(argument)?;
                }
                let method = match arena.get(*method_select).map(|d| &d.kind) {
                    Some(NodeKind::Identifier { name }) => {
                        let env = self.env_at(node)?;
                        let found = {
                            let mut resolver = self.resolver();
                            resolver.find_ident(env, name, SymbolFilter::METHOD)
                        };
                        if !self.symbols.arena.get(found).is_erroneous() {
                            self.model.associate_reference(*method_select, found);
                        }
                        found
                    }
                    Some(NodeKind::MemberSelect {
                        expression,
                        identifier,
                    }) => {
                        let Some(name) = arena.identifier_name(*identifier) else {
                            return Err(SemanticError::malformed(
                                *identifier,
                                "method select without a method name",
                            ));
                        };
                        let qualifier = self.resolve_as(
                            *expression,
                            SymbolFilter::PACKAGE | SymbolFilter::TYPE | SymbolFilter::VARIABLE,
                        )?;
                        let site = if self.symbols.arena.get(qualifier).kind == SymbolKind::Package
                        {
                            self.symbols.unknown_type
                        } else {
                            self.symbols.type_of(qualifier)
                        };
                        let found = {
                            let mut resolver = self.resolver();
                            resolver.find_method(site, name)
                        };
                        if !self.symbols.arena.get(found).is_erroneous() {
                            self.model.associate_reference(*identifier, found);
                        }
                        found
                    }
                    _ => {
                        return Err(SemanticError::malformed(
                            *method_select,
                            "unexpected method select shape",
                        ));
                    }
                };
                let signature = self.symbols.type_of(method);
                self.model.register_type(*method_select, signature);
                let result = {
                    let ty = self.symbols.types.get(signature);
                    if ty.tag == TypeTag::Method && !ty.result_type.is_none() {
                        ty.result_type
                    } else {
                        self.symbols.unknown_type
                    }
                };
                self.model.register_type(node, result);
            }
            NodeKind::NewClass {
                identifier,
                arguments,
                class_body,
            } => {
                let constructed = self.resolve_type(*identifier)?;
                for &argument in arguments {
                    self.scan(argument)?;
                }
                match class_body {
                    Some(body) => {
                        if let Some(anonymous) = self.model.symbol_at(*body) {
                            let anonymous_type = self.symbols.arena.get(anonymous).type_id;
                            if !anonymous_type.is_none() {
                                self.symbols.types.get_mut(anonymous_type).supertype =
                                    constructed;
                            }
                        }
                        self.scan(*body)?;
                        // The anonymous subtype has no denotable name; the
                        // expression is typed unknown.
                        self.model.register_type(node, self.symbols.unknown_type);
                    }
                    None => self.model.register_type(node, constructed),
                }
            }
            NodeKind::NewArray {
                element_type,
                dimensions,
                initializers,
            } => {
                for &dimension in dimensions {
                    self.scan(dimension)?;
                }
                for &initializer in initializers {
                    self.scan(initializer)?;
                }
                let mut constructed = self.resolve_type(*element_type)?;
                let array_class = self.symbols.array_class;
                // `new int[]{..}` has no explicit dimensions but still one
                // array layer.
                for _ in 0..dimensions.len().max(1) {
                    constructed = self.symbols.types.alloc(Type::array(constructed, array_class));
                }
                self.model.register_type(node, constructed);
            }
            NodeKind::ArrayAccess { expression, index } => {
                self.scan(*expression)?;
                self.scan(*index)?;
                let indexed = self.type_of_node(*expression);
                let element = {
                    let ty = self.symbols.types.get(indexed);
                    if ty.tag == TypeTag::Array && !ty.element_type.is_none() {
                        ty.element_type
                    } else {
                        self.symbols.unknown_type
                    }
                };
                self.model.register_type(node, element);
            }
            NodeKind::Binary { op, left, right } => {
                self.scan(*left)?;
                self.scan(*right)?;
                let left_type = self.type_of_node(*left);
                let right_type = self.type_of_node(*right);
                let operator = {
                    let mut resolver = self.resolver();
                    resolver.find_operator(op.token(), left_type, right_type)
                };
                let result = {
                    let signature = self.symbols.types.get(self.symbols.type_of(operator));
                    if signature.tag == TypeTag::Method {
                        signature.result_type
                    } else {
                        self.symbols.unknown_type
                    }
                };
                self.model.register_type(node, result);
            }
            NodeKind::Unary { operand, .. } => {
                self.scan(*operand)?;
                let inner = self.type_of_node(*operand);
                self.model.register_type(node, inner);
            }
            NodeKind::Assignment {
                variable,
                expression,
            } => {
                self.scan(*variable)?;
                self.scan(*expression)?;
                let target = self.type_of_node(*variable);
                self.model.register_type(node, target);
            }
            NodeKind::Conditional {
                condition,
                true_expression,
                false_expression,
            } => {
                self.scan(*condition)?;
                self.scan(*true_expression)?;
                self.scan(*false_expression)?;
                // No least-upper-bound computation; the value type stays
                // unknown.
                self.model.register_type(node, self.symbols.unknown_type);
            }
            NodeKind::InstanceOf {
                expression,
                instance_type,
            } => {
                self.scan(*expression)?;
                self.resolve_type(*instance_type)?;
                self.model.register_type(node, self.symbols.boolean_type);
            }
            NodeKind::TypeCast {
                cast_type,
                expression,
            } => {
                let target = self.resolve_type(*cast_type)?;
                self.scan(*expression)?;
                self.model.register_type(node, target);
            }
            NodeKind::Parenthesized { expression } => {
                self.scan(*expression)?;
                let inner = self.type_of_node(*expression);
                self.model.register_type(node, inner);
            }
            NodeKind::Literal { kind, .. } => {
                let literal_type = match kind {
                    LiteralKind::Boolean => self.symbols.boolean_type,
                    LiteralKind::Null => self.symbols.null_type,
                    LiteralKind::Char => self.symbols.char_type,
                    LiteralKind::String => self.symbols.string_type,
                    LiteralKind::Float => self.symbols.float_type,
                    LiteralKind::Double => self.symbols.double_type,
                    LiteralKind::Long => self.symbols.long_type,
                    LiteralKind::Int => self.symbols.int_type,
                };
                self.model.register_type(node, literal_type);
            }

            NodeKind::PrimitiveType { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::ParameterizedType { .. } => {
                if self.model.type_at(node).is_none() {
                    self.resolve_type(node)?;
                }
            }
            NodeKind::Other => {
                self.model.register_type(node, self.symbols.unknown_type);
            }
        }
        Ok(())
    }
}
