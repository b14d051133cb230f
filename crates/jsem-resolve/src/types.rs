//! Resolved types.
//!
//! Every expression node ends the analysis with exactly one `TypeId`. A
//! single unknown type is allocated per analysis run and substituted
//! wherever a type cannot be determined; nothing in the model is ever
//! "absent" once the solver has run.

use std::fmt;

use crate::symbols::SymbolId;

/// Identity of a type inside the run-scoped [`TypeArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == TypeId::NONE
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "TypeId(NONE)")
        } else {
            write!(f, "TypeId({})", self.0)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeTag {
    Class,
    Array,
    Method,
    Primitive,
    Unknown,
}

/// A resolved type.
///
/// One struct covers all shapes; the fields beyond `tag` and `symbol` are
/// populated per tag (element type for arrays, signature for methods,
/// hierarchy links for classes) and sentinel/empty otherwise.
#[derive(Clone, Debug)]
pub struct Type {
    pub tag: TypeTag,
    /// Declaring symbol for class and primitive types; the array
    /// pseudo-class for array types; `NONE` for method and unknown types.
    pub symbol: SymbolId,
    /// Element type of an array type.
    pub element_type: TypeId,
    /// Parameter types of a method type.
    pub parameter_types: Vec<TypeId>,
    /// Result type of a method type.
    pub result_type: TypeId,
    /// Superclass of a class type; `NONE` until resolved and for
    /// `java.lang.Object`.
    pub supertype: TypeId,
    /// Superinterfaces of a class type.
    pub interfaces: Vec<TypeId>,
}

impl Type {
    fn with_tag(tag: TypeTag, symbol: SymbolId) -> Type {
        Type {
            tag,
            symbol,
            element_type: TypeId::NONE,
            parameter_types: Vec::new(),
            result_type: TypeId::NONE,
            supertype: TypeId::NONE,
            interfaces: Vec::new(),
        }
    }

    pub fn unknown() -> Type {
        Type::with_tag(TypeTag::Unknown, SymbolId::NONE)
    }

    pub fn class(symbol: SymbolId) -> Type {
        Type::with_tag(TypeTag::Class, symbol)
    }

    pub fn primitive(symbol: SymbolId) -> Type {
        Type::with_tag(TypeTag::Primitive, symbol)
    }

    pub fn array(element_type: TypeId, array_class: SymbolId) -> Type {
        let mut ty = Type::with_tag(TypeTag::Array, array_class);
        ty.element_type = element_type;
        ty
    }

    pub fn method(parameter_types: Vec<TypeId>, result_type: TypeId) -> Type {
        let mut ty = Type::with_tag(TypeTag::Method, SymbolId::NONE);
        ty.parameter_types = parameter_types;
        ty.result_type = result_type;
        ty
    }

    pub fn is_unknown(&self) -> bool {
        self.tag == TypeTag::Unknown
    }
}

/// Run-scoped storage for types.
#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<Type>,
}

impl TypeArena {
    pub fn new() -> TypeArena {
        TypeArena::default()
    }

    pub fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
