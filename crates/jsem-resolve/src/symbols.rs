//! Symbols: declared entities and their resolution-failure sentinels.
//!
//! Every lookup in the resolver returns a `SymbolId` — never an absent
//! value. Failed lookups yield the run's unknown symbol, whose kind sits in
//! the erroneous tier; callers test `kind.is_erroneous()` instead of
//! null-checking. Constructing a symbol never fails.

use std::fmt;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::types::{Type, TypeArena, TypeId};

/// Identity of a symbol inside the run-scoped [`SymbolArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == SymbolId::NONE
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "SymbolId(NONE)")
        } else {
            write!(f, "SymbolId({})", self.0)
        }
    }
}

/// What a symbol is. The first four values are the only kinds a well-formed
/// declaration produces; the rest form the erroneous tier returned by failed
/// lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Package,
    Type,
    Variable,
    Method,
    Erroneous,
    Unknown,
    Absent,
    Ambiguous,
}

impl SymbolKind {
    /// True for the failure-sentinel tier.
    pub fn is_erroneous(self) -> bool {
        matches!(
            self,
            SymbolKind::Erroneous | SymbolKind::Unknown | SymbolKind::Absent | SymbolKind::Ambiguous
        )
    }

    /// Whether a symbol of this kind satisfies a lookup filter. Erroneous
    /// kinds never satisfy any filter.
    pub fn matches(self, filter: SymbolFilter) -> bool {
        match self {
            SymbolKind::Package => filter.contains(SymbolFilter::PACKAGE),
            SymbolKind::Type => filter.contains(SymbolFilter::TYPE),
            SymbolKind::Variable => filter.contains(SymbolFilter::VARIABLE),
            SymbolKind::Method => filter.contains(SymbolFilter::METHOD),
            _ => false,
        }
    }
}

bitflags! {
    /// Kind filter for lookups: callers request "variable or type",
    /// "package or type", and so on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SymbolFilter: u8 {
        const PACKAGE = 1 << 0;
        const TYPE = 1 << 1;
        const VARIABLE = 1 << 2;
        const METHOD = 1 << 3;
    }
}

/// A declared entity: package, type, variable, or method — or one of the
/// failure sentinels.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Enclosing symbol: a method's owner is its class, a top-level class's
    /// owner is its package. `NONE` only for the root package and sentinels.
    pub owner: SymbolId,
    pub type_id: TypeId,
    /// Members of type and package symbols, in declaration order.
    pub members: Vec<SymbolId>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, owner: SymbolId) -> Symbol {
        Symbol {
            kind,
            name: name.into(),
            owner,
            type_id: TypeId::NONE,
            members: Vec::new(),
        }
    }

    pub fn is_erroneous(&self) -> bool {
        self.kind.is_erroneous()
    }
}

/// Run-scoped storage for symbols.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> SymbolArena {
        SymbolArena::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The run-scoped symbol table: arenas plus every predefined entity —
/// packages, primitive types, `java.lang` stubs, the array pseudo-class and
/// the operator methods. Shared by all compilation units of one analysis
/// run.
#[derive(Debug)]
pub struct Symbols {
    pub arena: SymbolArena,
    pub types: TypeArena,

    pub root_package: SymbolId,
    pub default_package: SymbolId,
    pub java_lang: SymbolId,
    /// Owner of primitives and operator methods.
    pub predefined: SymbolId,
    pub array_class: SymbolId,
    pub unknown_symbol: SymbolId,
    pub unknown_type: TypeId,

    pub byte_type: TypeId,
    pub char_type: TypeId,
    pub short_type: TypeId,
    pub int_type: TypeId,
    pub long_type: TypeId,
    pub float_type: TypeId,
    pub double_type: TypeId,
    pub boolean_type: TypeId,
    pub void_type: TypeId,
    pub null_type: TypeId,

    pub object_type: TypeId,
    pub string_type: TypeId,
    /// Type of `X.class` expressions.
    pub class_type: TypeId,
    pub cloneable_type: TypeId,
    pub serializable_type: TypeId,

    operators: FxHashMap<&'static str, Vec<SymbolId>>,
}

impl Symbols {
    pub fn new() -> Symbols {
        let mut arena = SymbolArena::new();
        let mut types = TypeArena::new();

        // The single unknown sentinels of this run, allocated first.
        let unknown_type = types.alloc(Type::unknown());
        let unknown_symbol = arena.alloc(Symbol::new(SymbolKind::Unknown, "!unknown!", SymbolId::NONE));
        arena.get_mut(unknown_symbol).type_id = unknown_type;

        let root_package = arena.alloc(Symbol::new(SymbolKind::Package, "", SymbolId::NONE));
        let default_package = arena.alloc(Symbol::new(SymbolKind::Package, "", root_package));
        let predefined = arena.alloc(Symbol::new(SymbolKind::Type, "", root_package));

        let mut symbols = Symbols {
            arena,
            types,
            root_package,
            default_package,
            java_lang: SymbolId::NONE,
            predefined,
            array_class: SymbolId::NONE,
            unknown_symbol,
            unknown_type,
            byte_type: TypeId::NONE,
            char_type: TypeId::NONE,
            short_type: TypeId::NONE,
            int_type: TypeId::NONE,
            long_type: TypeId::NONE,
            float_type: TypeId::NONE,
            double_type: TypeId::NONE,
            boolean_type: TypeId::NONE,
            void_type: TypeId::NONE,
            null_type: TypeId::NONE,
            object_type: TypeId::NONE,
            string_type: TypeId::NONE,
            class_type: TypeId::NONE,
            cloneable_type: TypeId::NONE,
            serializable_type: TypeId::NONE,
            operators: FxHashMap::default(),
        };

        symbols.java_lang = symbols.enter_package("java.lang");

        symbols.byte_type = symbols.enter_primitive("byte");
        symbols.char_type = symbols.enter_primitive("char");
        symbols.short_type = symbols.enter_primitive("short");
        symbols.int_type = symbols.enter_primitive("int");
        symbols.long_type = symbols.enter_primitive("long");
        symbols.float_type = symbols.enter_primitive("float");
        symbols.double_type = symbols.enter_primitive("double");
        symbols.boolean_type = symbols.enter_primitive("boolean");
        symbols.void_type = symbols.enter_primitive("void");

        let object = symbols.enter_class("Object", symbols.java_lang);
        symbols.object_type = symbols.arena.get(object).type_id;
        let string = symbols.enter_class("String", symbols.java_lang);
        symbols.string_type = symbols.arena.get(string).type_id;
        symbols.types.get_mut(symbols.string_type).supertype = symbols.object_type;
        let class = symbols.enter_class("Class", symbols.java_lang);
        symbols.class_type = symbols.arena.get(class).type_id;
        symbols.types.get_mut(symbols.class_type).supertype = symbols.object_type;
        let cloneable = symbols.enter_class("Cloneable", symbols.java_lang);
        symbols.cloneable_type = symbols.arena.get(cloneable).type_id;
        let serializable = symbols.enter_class("Serializable", symbols.java_lang);
        symbols.serializable_type = symbols.arena.get(serializable).type_id;

        let null_class = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Type, "<nulltype>", symbols.root_package));
        symbols.null_type = symbols.types.alloc(Type::class(null_class));
        symbols.arena.get_mut(null_class).type_id = symbols.null_type;

        // Array pseudo-class: its own type is a class extending Object so
        // member lookup on array types falls through to Object; instances
        // additionally see the `length` field.
        let array_class = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Type, "Array", symbols.predefined));
        let array_class_type = symbols.types.alloc(Type::class(array_class));
        symbols.types.get_mut(array_class_type).supertype = symbols.object_type;
        symbols.arena.get_mut(array_class).type_id = array_class_type;
        let length = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, "length", array_class));
        symbols.arena.get_mut(length).type_id = symbols.int_type;
        symbols.arena.get_mut(array_class).members.push(length);
        symbols.array_class = array_class;

        symbols.enter_operators();
        symbols
    }

    /// Find or create the chain of package symbols for a dotted name.
    /// Idempotent: re-entering an existing package returns the same symbol.
    pub fn enter_package(&mut self, qualified_name: &str) -> SymbolId {
        if qualified_name.is_empty() {
            return self.default_package;
        }
        let mut current = self.root_package;
        for part in qualified_name.split('.') {
            let existing = self
                .arena
                .get(current)
                .members
                .iter()
                .copied()
                .find(|&m| {
                    let member = self.arena.get(m);
                    member.kind == SymbolKind::Package && member.name == part
                });
            current = match existing {
                Some(found) => found,
                None => {
                    let created = self.arena.alloc(Symbol::new(SymbolKind::Package, part, current));
                    self.arena.get_mut(current).members.push(created);
                    created
                }
            };
        }
        current
    }

    /// Existing package symbol for a dotted name, without creating one.
    pub fn lookup_package(&self, qualified_name: &str) -> Option<SymbolId> {
        if qualified_name.is_empty() {
            return Some(self.default_package);
        }
        let mut current = self.root_package;
        for part in qualified_name.split('.') {
            current = self.arena.get(current).members.iter().copied().find(|&m| {
                let member = self.arena.get(m);
                member.kind == SymbolKind::Package && member.name == part
            })?;
        }
        Some(current)
    }

    /// Allocate a class symbol and its class type under `owner`.
    pub fn enter_class(&mut self, name: &str, owner: SymbolId) -> SymbolId {
        let symbol = self.arena.alloc(Symbol::new(SymbolKind::Type, name, owner));
        let type_id = self.types.alloc(Type::class(symbol));
        self.arena.get_mut(symbol).type_id = type_id;
        if !owner.is_none() {
            self.arena.get_mut(owner).members.push(symbol);
        }
        symbol
    }

    /// Fresh erroneous symbol for a malformed declaration site.
    pub fn enter_erroneous(&mut self) -> SymbolId {
        let symbol = self
            .arena
            .alloc(Symbol::new(SymbolKind::Erroneous, "!error!", SymbolId::NONE));
        self.arena.get_mut(symbol).type_id = self.unknown_type;
        symbol
    }

    fn enter_primitive(&mut self, name: &'static str) -> TypeId {
        let symbol = self.arena.alloc(Symbol::new(SymbolKind::Type, name, self.predefined));
        let type_id = self.types.alloc(Type::primitive(symbol));
        self.arena.get_mut(symbol).type_id = type_id;
        self.arena.get_mut(self.predefined).members.push(symbol);
        type_id
    }

    pub fn primitive_by_name(&self, name: &str) -> Option<TypeId> {
        let found = match name {
            "byte" => self.byte_type,
            "char" => self.char_type,
            "short" => self.short_type,
            "int" => self.int_type,
            "long" => self.long_type,
            "float" => self.float_type,
            "double" => self.double_type,
            "boolean" => self.boolean_type,
            "void" => self.void_type,
            _ => return None,
        };
        Some(found)
    }

    /// Type of a symbol; unknown-type for erroneous symbols or symbols whose
    /// type was never determined.
    pub fn type_of(&self, symbol: SymbolId) -> TypeId {
        if symbol.is_none() {
            return self.unknown_type;
        }
        let sym = self.arena.get(symbol);
        if sym.is_erroneous() || sym.type_id.is_none() {
            self.unknown_type
        } else {
            sym.type_id
        }
    }

    /// Dotted fully-qualified name, reconstructed from the owner chain.
    pub fn full_name(&self, symbol: SymbolId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut current = symbol;
        while !current.is_none() {
            let sym = self.arena.get(current);
            if !sym.name.is_empty() {
                parts.push(&sym.name);
            }
            current = sym.owner;
        }
        parts.reverse();
        parts.join(".")
    }

    pub fn operator_candidates(&self, token: &str) -> &[SymbolId] {
        self.operators.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    fn enter_operator(&mut self, token: &'static str, parameters: [TypeId; 2], result: TypeId) {
        let symbol = self
            .arena
            .alloc(Symbol::new(SymbolKind::Method, token, self.predefined));
        let type_id = self.types.alloc(Type::method(parameters.to_vec(), result));
        self.arena.get_mut(symbol).type_id = type_id;
        self.operators.entry(token).or_default().push(symbol);
    }

    /// Predefined operator methods: arithmetic with binary numeric
    /// promotion, string concatenation, comparisons, equality, logical and
    /// bitwise operators, shifts.
    fn enter_operators(&mut self) {
        // Widening order mirrors binary numeric promotion.
        let numeric = [
            self.int_type,
            self.long_type,
            self.float_type,
            self.double_type,
        ];
        for token in ["+", "-", "*", "/", "%"] {
            for (left_rank, &left) in numeric.iter().enumerate() {
                for (right_rank, &right) in numeric.iter().enumerate() {
                    let result = if left_rank >= right_rank { left } else { right };
                    self.enter_operator(token, [left, right], result);
                }
            }
        }
        self.enter_operator("+", [self.string_type, self.string_type], self.string_type);
        for token in ["<", "<=", ">", ">="] {
            for &left in &numeric {
                for &right in &numeric {
                    self.enter_operator(token, [left, right], self.boolean_type);
                }
            }
        }
        for token in ["==", "!="] {
            for &left in &numeric {
                for &right in &numeric {
                    self.enter_operator(token, [left, right], self.boolean_type);
                }
            }
            self.enter_operator(token, [self.boolean_type, self.boolean_type], self.boolean_type);
            self.enter_operator(token, [self.object_type, self.object_type], self.boolean_type);
        }
        for token in ["&&", "||"] {
            self.enter_operator(token, [self.boolean_type, self.boolean_type], self.boolean_type);
        }
        for token in ["&", "|", "^"] {
            self.enter_operator(token, [self.int_type, self.int_type], self.int_type);
            self.enter_operator(token, [self.long_type, self.long_type], self.long_type);
            self.enter_operator(token, [self.boolean_type, self.boolean_type], self.boolean_type);
        }
        for token in ["<<", ">>", ">>>"] {
            self.enter_operator(token, [self.int_type, self.int_type], self.int_type);
            self.enter_operator(token, [self.int_type, self.long_type], self.int_type);
            self.enter_operator(token, [self.long_type, self.int_type], self.long_type);
            self.enter_operator(token, [self.long_type, self.long_type], self.long_type);
        }
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Symbols::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTag;

    #[test]
    fn erroneous_tier_never_matches_filters() {
        for kind in [
            SymbolKind::Erroneous,
            SymbolKind::Unknown,
            SymbolKind::Absent,
            SymbolKind::Ambiguous,
        ] {
            assert!(kind.is_erroneous());
            assert!(!kind.matches(SymbolFilter::all()));
        }
        assert!(SymbolKind::Variable.matches(SymbolFilter::VARIABLE | SymbolFilter::TYPE));
        assert!(!SymbolKind::Variable.matches(SymbolFilter::TYPE));
    }

    #[test]
    fn unknown_sentinels_are_allocated_first() {
        let symbols = Symbols::new();
        assert_eq!(symbols.unknown_type, TypeId(0));
        assert_eq!(symbols.unknown_symbol, SymbolId(0));
        assert!(symbols.types.get(symbols.unknown_type).is_unknown());
        assert!(symbols.arena.get(symbols.unknown_symbol).is_erroneous());
    }

    #[test]
    fn enter_package_is_idempotent() {
        let mut symbols = Symbols::new();
        let first = symbols.enter_package("com.example.util");
        let second = symbols.enter_package("com.example.util");
        assert_eq!(first, second);
        assert_eq!(symbols.full_name(first), "com.example.util");
        let parent = symbols.enter_package("com.example");
        assert_eq!(symbols.arena.get(first).owner, parent);
    }

    #[test]
    fn java_lang_stubs_are_predefined() {
        let symbols = Symbols::new();
        let string = symbols.types.get(symbols.string_type);
        assert_eq!(string.tag, TypeTag::Class);
        assert_eq!(symbols.full_name(string.symbol), "java.lang.String");
        assert_eq!(string.supertype, symbols.object_type);
    }

    #[test]
    fn operator_table_covers_int_addition() {
        let symbols = Symbols::new();
        let found = symbols.operator_candidates("+").iter().any(|&op| {
            let ty = symbols.types.get(symbols.arena.get(op).type_id);
            ty.parameter_types == vec![symbols.int_type, symbols.int_type]
                && ty.result_type == symbols.int_type
        });
        assert!(found);
    }

    #[test]
    fn array_instances_expose_length() {
        let symbols = Symbols::new();
        let array = symbols.arena.get(symbols.array_class);
        let length = array
            .members
            .iter()
            .copied()
            .find(|&m| symbols.arena.get(m).name == "length")
            .expect("length member");
        assert_eq!(symbols.arena.get(length).type_id, symbols.int_type);
    }
}
