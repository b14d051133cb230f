//! Arena storage for syntax trees.

use jsem_common::Span;

use crate::node::{LiteralKind, NodeId, NodeKind};

#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub span: Span,
}

/// Owns all nodes of one compilation unit.
///
/// Nodes are immutable once pushed; the semantic phase addresses them only
/// through their `NodeId`.
#[derive(Debug, Default)]
pub struct TreeArena {
    nodes: Vec<NodeData>,
}

impl TreeArena {
    pub fn new() -> TreeArena {
        TreeArena::default()
    }

    pub fn with_capacity(capacity: usize) -> TreeArena {
        TreeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { kind, span });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// Kind of `id`. Panics on an id from another arena; use [`get`] when
    /// the id's origin is not statically known.
    ///
    /// [`get`]: TreeArena::get
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Name of an identifier node, if `id` is one.
    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|data| &data.kind) {
            Some(NodeKind::Identifier { name }) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn add_identifier(&mut self, name: impl Into<String>, span: Span) -> NodeId {
        self.push(NodeKind::Identifier { name: name.into() }, span)
    }

    pub fn add_literal(
        &mut self,
        kind: LiteralKind,
        value: impl Into<String>,
        span: Span,
    ) -> NodeId {
        self.push(
            NodeKind::Literal {
                kind,
                value: value.into(),
            },
            span,
        )
    }

    /// Invokes `f` for each immediate child of `id`, in syntactic order.
    pub fn for_each_child(&self, id: NodeId, mut f: impl FnMut(NodeId)) {
        let Some(data) = self.get(id) else {
            return;
        };
        let mut one = |child: NodeId| f(child);
        let opt = |child: &Option<NodeId>, f: &mut dyn FnMut(NodeId)| {
            if let Some(child) = child {
                f(*child);
            }
        };
        let many = |children: &[NodeId], f: &mut dyn FnMut(NodeId)| {
            for child in children {
                f(*child);
            }
        };
        match &data.kind {
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            } => {
                opt(package, &mut one);
                many(imports, &mut one);
                many(types, &mut one);
            }
            NodeKind::PackageDeclaration { name } => one(*name),
            NodeKind::Import { qualified, .. } => one(*qualified),
            NodeKind::ClassDeclaration {
                superclass,
                interfaces,
                members,
                ..
            } => {
                opt(superclass, &mut one);
                many(interfaces, &mut one);
                many(members, &mut one);
            }
            NodeKind::MethodDeclaration {
                return_type,
                parameters,
                throws,
                body,
                ..
            } => {
                opt(return_type, &mut one);
                many(parameters, &mut one);
                many(throws, &mut one);
                opt(body, &mut one);
            }
            NodeKind::Variable {
                var_type,
                initializer,
                ..
            } => {
                one(*var_type);
                opt(initializer, &mut one);
            }
            NodeKind::EnumConstant { initializer, .. } => one(*initializer),
            NodeKind::Block { statements } => many(statements, &mut one),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                one(*condition);
                one(*then_branch);
                opt(else_branch, &mut one);
            }
            NodeKind::While { condition, body } => {
                one(*condition);
                one(*body);
            }
            NodeKind::For {
                initializer,
                condition,
                update,
                body,
            } => {
                many(initializer, &mut one);
                opt(condition, &mut one);
                many(update, &mut one);
                one(*body);
            }
            NodeKind::ForEach {
                variable,
                expression,
                body,
            } => {
                one(*variable);
                one(*expression);
                one(*body);
            }
            NodeKind::Return { expression } => opt(expression, &mut one),
            NodeKind::Throw { expression } => one(*expression),
            NodeKind::Try {
                block,
                catches,
                finally_block,
            } => {
                one(*block);
                many(catches, &mut one);
                opt(finally_block, &mut one);
            }
            NodeKind::Catch { parameter, block } => {
                one(*parameter);
                one(*block);
            }
            NodeKind::ExpressionStatement { expression } => one(*expression),
            NodeKind::LabeledStatement { statement, .. } => one(*statement),
            NodeKind::Break { .. } | NodeKind::Continue { .. } => {}
            NodeKind::Identifier { .. } => {}
            NodeKind::MemberSelect {
                expression,
                identifier,
            } => {
                one(*expression);
                one(*identifier);
            }
            NodeKind::MethodInvocation {
                method_select,
                arguments,
            } => {
                one(*method_select);
                many(arguments, &mut one);
            }
            NodeKind::NewClass {
                identifier,
                arguments,
                class_body,
            } => {
                one(*identifier);
                many(arguments, &mut one);
                opt(class_body, &mut one);
            }
            NodeKind::NewArray {
                element_type,
                dimensions,
                initializers,
            } => {
                one(*element_type);
                many(dimensions, &mut one);
                many(initializers, &mut one);
            }
            NodeKind::ArrayAccess { expression, index } => {
                one(*expression);
                one(*index);
            }
            NodeKind::Binary { left, right, .. } => {
                one(*left);
                one(*right);
            }
            NodeKind::Unary { operand, .. } => one(*operand),
            NodeKind::Assignment {
                variable,
                expression,
            } => {
                one(*variable);
                one(*expression);
            }
            NodeKind::Conditional {
                condition,
                true_expression,
                false_expression,
            } => {
                one(*condition);
                one(*true_expression);
                one(*false_expression);
            }
            NodeKind::InstanceOf {
                expression,
                instance_type,
            } => {
                one(*expression);
                one(*instance_type);
            }
            NodeKind::TypeCast {
                cast_type,
                expression,
            } => {
                one(*cast_type);
                one(*expression);
            }
            NodeKind::Parenthesized { expression } => one(*expression),
            NodeKind::Literal { .. } => {}
            NodeKind::PrimitiveType { .. } => {}
            NodeKind::ArrayType { element } => one(*element),
            NodeKind::ParameterizedType { raw, arguments } => {
                one(*raw);
                many(arguments, &mut one);
            }
            NodeKind::Other => {}
        }
    }

    /// Immediate children of `id`, in syntactic order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.for_each_child(id, |child| out.push(child));
        out
    }
}
