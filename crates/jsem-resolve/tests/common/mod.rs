#![allow(dead_code)]

//! Tree construction helpers shared by the integration tests.

use jsem_ast::{BinaryOp, ClassKind, LiteralKind, NodeId, NodeKind, TreeArena};
use jsem_common::Span;
use jsem_resolve::{BytecodeCompleter, SemanticModel, Symbols, create_semantic_model};

#[derive(Default)]
pub struct TreeBuilder {
    pub arena: TreeArena,
}

impl TreeBuilder {
    pub fn new() -> TreeBuilder {
        TreeBuilder::default()
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.arena.add_identifier(name, Span::EMPTY)
    }

    pub fn literal(&mut self, kind: LiteralKind, value: &str) -> NodeId {
        self.arena.add_literal(kind, value, Span::EMPTY)
    }

    pub fn int_literal(&mut self, value: &str) -> NodeId {
        self.literal(LiteralKind::Int, value)
    }

    pub fn primitive(&mut self, keyword: &str) -> NodeId {
        self.arena.push(
            NodeKind::PrimitiveType {
                keyword: keyword.to_string(),
            },
            Span::EMPTY,
        )
    }

    pub fn array_type(&mut self, element: NodeId) -> NodeId {
        self.arena.push(NodeKind::ArrayType { element }, Span::EMPTY)
    }

    /// Identifier or member-select chain for a dotted name.
    pub fn qualified_name(&mut self, dotted: &str) -> NodeId {
        let mut parts = dotted.split('.');
        let mut node = self.ident(parts.next().expect("non-empty name"));
        for part in parts {
            let identifier = self.ident(part);
            node = self.arena.push(
                NodeKind::MemberSelect {
                    expression: node,
                    identifier,
                },
                Span::EMPTY,
            );
        }
        node
    }

    /// Member select `qualifier.name`; returns the select node and the
    /// identifier node references are recorded against.
    pub fn select(&mut self, qualifier: NodeId, name: &str) -> (NodeId, NodeId) {
        let identifier = self.ident(name);
        let node = self.arena.push(
            NodeKind::MemberSelect {
                expression: qualifier,
                identifier,
            },
            Span::EMPTY,
        );
        (node, identifier)
    }

    pub fn variable(&mut self, name: &str, var_type: NodeId, initializer: Option<NodeId>) -> NodeId {
        self.arena.push(
            NodeKind::Variable {
                name: name.to_string(),
                var_type,
                initializer,
            },
            Span::EMPTY,
        )
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.arena.push(NodeKind::Block { statements }, Span::EMPTY)
    }

    pub fn expr_stmt(&mut self, expression: NodeId) -> NodeId {
        self.arena
            .push(NodeKind::ExpressionStatement { expression }, Span::EMPTY)
    }

    pub fn ret(&mut self, expression: Option<NodeId>) -> NodeId {
        self.arena.push(NodeKind::Return { expression }, Span::EMPTY)
    }

    pub fn method(
        &mut self,
        name: &str,
        return_type: Option<NodeId>,
        parameters: Vec<NodeId>,
        statements: Vec<NodeId>,
    ) -> NodeId {
        let body = self.block(statements);
        self.arena.push(
            NodeKind::MethodDeclaration {
                name: name.to_string(),
                return_type,
                parameters,
                throws: Vec::new(),
                body: Some(body),
            },
            Span::EMPTY,
        )
    }

    pub fn class(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        self.class_extending(name, None, members)
    }

    pub fn class_extending(
        &mut self,
        name: &str,
        superclass: Option<NodeId>,
        members: Vec<NodeId>,
    ) -> NodeId {
        self.arena.push(
            NodeKind::ClassDeclaration {
                kind: ClassKind::Class,
                name: name.to_string(),
                superclass,
                interfaces: Vec::new(),
                members,
            },
            Span::EMPTY,
        )
    }

    pub fn invoke(&mut self, method_select: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.arena.push(
            NodeKind::MethodInvocation {
                method_select,
                arguments,
            },
            Span::EMPTY,
        )
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.arena
            .push(NodeKind::Binary { op, left, right }, Span::EMPTY)
    }

    pub fn assignment(&mut self, variable: NodeId, expression: NodeId) -> NodeId {
        self.arena.push(
            NodeKind::Assignment {
                variable,
                expression,
            },
            Span::EMPTY,
        )
    }

    pub fn unit(&mut self, types: Vec<NodeId>) -> NodeId {
        self.unit_in(None, &[], types)
    }

    /// Compilation unit with an optional package and `(name, on_demand)`
    /// imports.
    pub fn unit_in(
        &mut self,
        package: Option<&str>,
        imports: &[(&str, bool)],
        types: Vec<NodeId>,
    ) -> NodeId {
        let package = package.map(|dotted| {
            let name = self.qualified_name(dotted);
            self.arena
                .push(NodeKind::PackageDeclaration { name }, Span::EMPTY)
        });
        let imports = imports
            .iter()
            .map(|&(dotted, on_demand)| {
                let qualified = self.qualified_name(dotted);
                self.arena.push(
                    NodeKind::Import {
                        qualified,
                        is_static: false,
                        on_demand,
                    },
                    Span::EMPTY,
                )
            })
            .collect();
        self.arena.push(
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
            Span::EMPTY,
        )
    }
}

/// Run the full pipeline over a tree with an empty classpath.
pub fn analyze(arena: &TreeArena, unit: NodeId) -> (Symbols, SemanticModel) {
    let mut completer = BytecodeCompleter::empty();
    analyze_with(arena, unit, &mut completer)
}

pub fn analyze_with(
    arena: &TreeArena,
    unit: NodeId,
    completer: &mut BytecodeCompleter,
) -> (Symbols, SemanticModel) {
    let mut symbols = Symbols::new();
    let model = create_semantic_model(arena, unit, &mut symbols, completer)
        .expect("semantic analysis succeeds");
    (symbols, model)
}
