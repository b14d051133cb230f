//! Node identities and the closed set of node kinds.

use std::fmt;

/// Stable identity of a node inside its [`crate::TreeArena`].
///
/// Usable as a map key; `NodeId::NONE` is the absent sentinel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == NodeId::NONE
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

/// Literal kinds, one per entry of the literal typing table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Boolean,
    Null,
    Char,
    String,
    Float,
    Double,
    Long,
    Int,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    EqualTo,
    NotEqualTo,
    ConditionalAnd,
    ConditionalOr,
    And,
    Or,
    Xor,
    LeftShift,
    RightShift,
    UnsignedRightShift,
}

impl BinaryOp {
    /// Operator token text, used as the name of the predefined operator
    /// method it resolves to.
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::EqualTo => "==",
            BinaryOp::NotEqualTo => "!=",
            BinaryOp::ConditionalAnd => "&&",
            BinaryOp::ConditionalOr => "||",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    LogicalNot,
    BitwiseComplement,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
}

/// The closed set of node kinds.
///
/// The semantic phase dispatches on this enum with exhaustive matches, so a
/// new kind is a compile-time obligation for every pass rather than a
/// silently skipped case.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    CompilationUnit {
        /// `PackageDeclaration`, absent for the default package.
        package: Option<NodeId>,
        imports: Vec<NodeId>,
        types: Vec<NodeId>,
    },
    PackageDeclaration {
        /// Identifier or member-select chain naming the package.
        name: NodeId,
    },
    Import {
        /// Member-select chain (or identifier) naming the imported entity.
        qualified: NodeId,
        /// `import static pkg.Type.member;` — resolved through the same
        /// import scopes as a type import.
        is_static: bool,
        /// `import pkg.*;`
        on_demand: bool,
    },
    ClassDeclaration {
        kind: ClassKind,
        /// Empty for anonymous class bodies.
        name: String,
        superclass: Option<NodeId>,
        interfaces: Vec<NodeId>,
        members: Vec<NodeId>,
    },
    MethodDeclaration {
        name: String,
        /// Absent for constructors.
        return_type: Option<NodeId>,
        /// `Variable` nodes.
        parameters: Vec<NodeId>,
        throws: Vec<NodeId>,
        body: Option<NodeId>,
    },
    /// Field, local variable, or parameter declaration.
    Variable {
        name: String,
        var_type: NodeId,
        initializer: Option<NodeId>,
    },
    EnumConstant {
        name: String,
        /// `NewClass` initializer, as produced by the parser.
        initializer: NodeId,
    },
    Block {
        statements: Vec<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    For {
        initializer: Vec<NodeId>,
        condition: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    ForEach {
        variable: NodeId,
        expression: NodeId,
        body: NodeId,
    },
    Return {
        expression: Option<NodeId>,
    },
    Throw {
        expression: NodeId,
    },
    Try {
        block: NodeId,
        catches: Vec<NodeId>,
        finally_block: Option<NodeId>,
    },
    Catch {
        /// `Variable` node introducing the caught exception.
        parameter: NodeId,
        block: NodeId,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    LabeledStatement {
        label: String,
        statement: NodeId,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Identifier {
        name: String,
    },
    MemberSelect {
        expression: NodeId,
        /// `Identifier` node carrying the selected name; references are
        /// recorded against it.
        identifier: NodeId,
    },
    MethodInvocation {
        /// Identifier (implicit receiver) or member select.
        method_select: NodeId,
        arguments: Vec<NodeId>,
    },
    NewClass {
        /// Type identifier after `new`.
        identifier: NodeId,
        arguments: Vec<NodeId>,
        /// Anonymous class body (`ClassDeclaration` with an empty name).
        class_body: Option<NodeId>,
    },
    NewArray {
        element_type: NodeId,
        dimensions: Vec<NodeId>,
        initializers: Vec<NodeId>,
    },
    ArrayAccess {
        expression: NodeId,
        index: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Assignment {
        variable: NodeId,
        expression: NodeId,
    },
    Conditional {
        condition: NodeId,
        true_expression: NodeId,
        false_expression: NodeId,
    },
    InstanceOf {
        expression: NodeId,
        instance_type: NodeId,
    },
    TypeCast {
        cast_type: NodeId,
        expression: NodeId,
    },
    Parenthesized {
        expression: NodeId,
    },
    Literal {
        kind: LiteralKind,
        value: String,
    },
    PrimitiveType {
        /// Keyword text: `int`, `boolean`, ...
        keyword: String,
    },
    ArrayType {
        element: NodeId,
    },
    ParameterizedType {
        raw: NodeId,
        arguments: Vec<NodeId>,
    },
    /// Anything the analyzer does not model. Still typed (unknown) by the
    /// cleanup sweep.
    Other,
}

impl NodeKind {
    pub fn is_type_declaration(&self) -> bool {
        matches!(self, NodeKind::ClassDeclaration { .. })
    }
}
