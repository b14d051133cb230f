//! Name resolution.
//!
//! Lookups walk the environment chain from innermost scope outward, then
//! fall back to the compilation unit's imports, the current package, and
//! finally the classpath. Every lookup is total: a name that resolves
//! nowhere yields the run's unknown symbol, and the erroneous tier never
//! satisfies a filter, so a shadowed-but-wrong-kind match keeps the search
//! going.
//!
//! Method lookups match by name only. Overload selection by argument types
//! is out of scope; the first member with the requested name and the
//! method kind wins, searched in the class before its supertype before its
//! interfaces.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::completer::{BytecodeCompleter, split_qualified};
use crate::env::{EnvArena, EnvId};
use crate::symbols::{SymbolFilter, SymbolId, SymbolKind, Symbols};
use crate::types::{TypeId, TypeTag};

pub struct Resolver<'a> {
    pub symbols: &'a mut Symbols,
    pub envs: &'a EnvArena,
    pub completer: &'a mut BytecodeCompleter,
}

impl<'a> Resolver<'a> {
    /// Resolve a simple name in the scope chain starting at `env`.
    ///
    /// Scope order: local declarations innermost-first (later declarations
    /// shadow earlier ones of the same name), inherited members at each
    /// class boundary, then single-type imports, the current package,
    /// on-demand imports, predefined types, and the classpath root.
    pub fn find_ident(&mut self, env: EnvId, name: &str, filter: SymbolFilter) -> SymbolId {
        let mut current = env;
        while !current.is_none() {
            let scope = self.envs.get(current).scope.clone();
            for &symbol in scope.iter().rev() {
                let sym = self.symbols.arena.get(symbol);
                if sym.name == name && sym.kind.matches(filter) {
                    return symbol;
                }
            }

            let enclosing = self.envs.get(current).enclosing_class;
            let outer = self.envs.get(current).outer;
            let outer_class = if outer.is_none() {
                SymbolId::NONE
            } else {
                self.envs.get(outer).enclosing_class
            };
            // A class boundary brings inherited members into scope.
            if !enclosing.is_none() && enclosing != outer_class {
                let class_type = self.symbols.arena.get(enclosing).type_id;
                let inherited = self.find_member(class_type, name, filter);
                if !self.symbols.arena.get(inherited).is_erroneous() {
                    return inherited;
                }
            }
            current = outer;
        }

        let unit = self.compilation_unit_env(env);

        if filter.contains(SymbolFilter::TYPE) {
            let named = self.envs.get(unit).named_imports.clone();
            for fqn in &named {
                let (_, simple) = split_qualified(fqn);
                if simple == name {
                    let imported = self.resolve_qualified_type(fqn);
                    if !self.symbols.arena.get(imported).is_erroneous() {
                        return imported;
                    }
                }
            }

            let package = self.envs.get(unit).package_symbol;
            let sibling =
                self.find_ident_in_package(package, name, SymbolFilter::TYPE);
            if !self.symbols.arena.get(sibling).is_erroneous() {
                return sibling;
            }

            let stars = self.envs.get(unit).star_imports.clone();
            for prefix in &stars {
                let on_demand = self.resolve_qualified_type(&format!("{prefix}.{name}"));
                if !self.symbols.arena.get(on_demand).is_erroneous() {
                    return on_demand;
                }
            }

            // Primitive type keywords and other predefined types.
            let predefined = self.symbols.arena.get(self.symbols.predefined).members.clone();
            for &symbol in &predefined {
                let sym = self.symbols.arena.get(symbol);
                if sym.name == name && sym.kind.matches(filter) {
                    return symbol;
                }
            }

            // Last resort for types: a top-level class in the default
            // package, completed from the classpath.
            let completed = self.completer.complete(self.symbols, name);
            if !self.symbols.arena.get(completed).is_erroneous() {
                return completed;
            }
        }

        if filter.contains(SymbolFilter::PACKAGE) {
            // A bare name in package position names a package whether or
            // not anything was declared in it yet; materializing it lets
            // deeper qualifiers resolve against the classpath.
            return self.symbols.enter_package(name);
        }

        debug!(name, ?filter, "unresolved identifier");
        self.symbols.unknown_symbol
    }

    /// Member of a class or array type, searching the type itself, then its
    /// superclass chain, then its interfaces. Cycles in a malformed
    /// hierarchy terminate via the visited set.
    pub fn find_member(&mut self, site: TypeId, name: &str, filter: SymbolFilter) -> SymbolId {
        let mut visited = FxHashSet::default();
        self.find_member_in(site, name, filter, &mut visited)
    }

    fn find_member_in(
        &mut self,
        site: TypeId,
        name: &str,
        filter: SymbolFilter,
        visited: &mut FxHashSet<TypeId>,
    ) -> SymbolId {
        if site.is_none() || !visited.insert(site) {
            return self.symbols.unknown_symbol;
        }
        let (owner, supertype, interfaces) = {
            let ty = self.symbols.types.get(site);
            match ty.tag {
                TypeTag::Class => (ty.symbol, ty.supertype, ty.interfaces.clone()),
                TypeTag::Array => {
                    // Array members live on the array pseudo-class, which
                    // extends Object.
                    let class = ty.symbol;
                    let class_type = self.symbols.arena.get(class).type_id;
                    let class_ty = self.symbols.types.get(class_type);
                    (class, class_ty.supertype, class_ty.interfaces.clone())
                }
                _ => return self.symbols.unknown_symbol,
            }
        };
        if owner.is_none() {
            return self.symbols.unknown_symbol;
        }

        let members = self.symbols.arena.get(owner).members.clone();
        for &member in &members {
            let sym = self.symbols.arena.get(member);
            if sym.name == name && sym.kind.matches(filter) {
                return member;
            }
        }

        let in_super = self.find_member_in(supertype, name, filter, visited);
        if !self.symbols.arena.get(in_super).is_erroneous() {
            return in_super;
        }
        for interface in interfaces {
            let in_interface = self.find_member_in(interface, name, filter, visited);
            if !self.symbols.arena.get(in_interface).is_erroneous() {
                return in_interface;
            }
        }
        self.symbols.unknown_symbol
    }

    /// Member of a package: a declared type or sub-package, or a type
    /// completed from the classpath under the package's qualified name.
    pub fn find_ident_in_package(
        &mut self,
        package: SymbolId,
        name: &str,
        filter: SymbolFilter,
    ) -> SymbolId {
        if package.is_none() || self.symbols.arena.get(package).kind != SymbolKind::Package {
            return self.symbols.unknown_symbol;
        }
        let members = self.symbols.arena.get(package).members.clone();
        for &member in &members {
            let sym = self.symbols.arena.get(member);
            if sym.name == name && sym.kind.matches(filter) {
                return member;
            }
        }

        let prefix = self.symbols.full_name(package);
        let fqn = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        if filter.contains(SymbolFilter::TYPE) {
            let completed = self.completer.complete(self.symbols, &fqn);
            if !self.symbols.arena.get(completed).is_erroneous() {
                return completed;
            }
        }
        if filter.contains(SymbolFilter::PACKAGE) {
            return self.symbols.enter_package(&fqn);
        }
        self.symbols.unknown_symbol
    }

    /// Method member of a type, by name only.
    pub fn find_method(&mut self, site: TypeId, name: &str) -> SymbolId {
        self.find_member(site, name, SymbolFilter::METHOD)
    }

    /// Predefined operator method for a binary operator applied to two
    /// operand types.
    pub fn find_operator(&mut self, token: &str, left: TypeId, right: TypeId) -> SymbolId {
        let string = self.symbols.string_type;
        if token == "+" && (left == string || right == string) {
            return self.exact_operator(token, string, string);
        }
        if token == "==" || token == "!=" {
            let left_ref = self.is_reference(left);
            let right_ref = self.is_reference(right);
            if left_ref && right_ref {
                let object = self.symbols.object_type;
                return self.exact_operator(token, object, object);
            }
        }
        let left = self.promote(left);
        let right = self.promote(right);
        self.exact_operator(token, left, right)
    }

    fn exact_operator(&mut self, token: &str, left: TypeId, right: TypeId) -> SymbolId {
        for &candidate in self.symbols.operator_candidates(token) {
            let signature = self.symbols.types.get(self.symbols.arena.get(candidate).type_id);
            if signature.parameter_types == [left, right] {
                return candidate;
            }
        }
        self.symbols.unknown_symbol
    }

    fn is_reference(&self, ty: TypeId) -> bool {
        if ty.is_none() {
            return false;
        }
        matches!(self.symbols.types.get(ty).tag, TypeTag::Class | TypeTag::Array)
    }

    /// Unary numeric promotion: byte, short, and char operands compute as
    /// int.
    fn promote(&self, ty: TypeId) -> TypeId {
        if ty == self.symbols.byte_type
            || ty == self.symbols.short_type
            || ty == self.symbols.char_type
        {
            self.symbols.int_type
        } else {
            ty
        }
    }

    /// Type for a fully-qualified name: a type already declared in this run
    /// if there is one, otherwise completed from the classpath.
    fn resolve_qualified_type(&mut self, fqn: &str) -> SymbolId {
        let (package_name, simple) = split_qualified(fqn);
        if let Some(package) = self.symbols.lookup_package(package_name) {
            let members = self.symbols.arena.get(package).members.clone();
            for &member in &members {
                let sym = self.symbols.arena.get(member);
                if sym.name == simple && sym.kind == SymbolKind::Type {
                    return member;
                }
            }
        }
        self.completer.complete(self.symbols, fqn)
    }

    fn compilation_unit_env(&self, env: EnvId) -> EnvId {
        let mut current = env;
        loop {
            let outer = self.envs.get(current).outer;
            if outer.is_none() {
                return current;
            }
            current = outer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::symbols::Symbol;

    fn resolver_fixture() -> (Symbols, EnvArena, BytecodeCompleter, EnvId) {
        let mut symbols = Symbols::new();
        let mut envs = EnvArena::new();
        let package = symbols.default_package;
        let unit = envs.alloc(Environment::compilation_unit(package));
        (symbols, envs, BytecodeCompleter::empty(), unit)
    }

    #[test]
    fn later_declarations_shadow_earlier_ones() {
        let (mut symbols, mut envs, mut completer, unit) = resolver_fixture();
        let outer_x = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, "x", SymbolId::NONE));
        let inner_x = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, "x", SymbolId::NONE));
        envs.get_mut(unit).scope.push(outer_x);
        let block = envs.nested(unit);
        envs.get_mut(block).scope.push(inner_x);

        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        assert_eq!(resolver.find_ident(block, "x", SymbolFilter::VARIABLE), inner_x);
        assert_eq!(resolver.find_ident(unit, "x", SymbolFilter::VARIABLE), outer_x);
    }

    #[test]
    fn wrong_kind_match_keeps_searching_outward() {
        let (mut symbols, mut envs, mut completer, unit) = resolver_fixture();
        let variable = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, "List", SymbolId::NONE));
        let block = envs.nested(unit);
        envs.get_mut(block).scope.push(variable);

        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        // The variable shadows nothing for a type-only lookup.
        let found = resolver.find_ident(block, "List", SymbolFilter::TYPE);
        assert!(resolver.symbols.arena.get(found).is_erroneous());
        let as_var = resolver.find_ident(block, "List", SymbolFilter::VARIABLE);
        assert_eq!(as_var, variable);
    }

    #[test]
    fn member_lookup_reaches_the_superclass() {
        let (mut symbols, envs, mut completer, _) = resolver_fixture();
        let base = symbols.enter_class("Base", symbols.default_package);
        let derived = symbols.enter_class("Derived", symbols.default_package);
        let base_type = symbols.arena.get(base).type_id;
        let derived_type = symbols.arena.get(derived).type_id;
        symbols.types.get_mut(derived_type).supertype = base_type;
        let field = symbols
            .arena
            .alloc(Symbol::new(SymbolKind::Variable, "value", base));
        symbols.arena.get_mut(base).members.push(field);

        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        assert_eq!(
            resolver.find_member(derived_type, "value", SymbolFilter::VARIABLE),
            field
        );
    }

    #[test]
    fn cyclic_hierarchy_lookup_terminates() {
        let (mut symbols, envs, mut completer, _) = resolver_fixture();
        let a = symbols.enter_class("A", symbols.default_package);
        let b = symbols.enter_class("B", symbols.default_package);
        let a_type = symbols.arena.get(a).type_id;
        let b_type = symbols.arena.get(b).type_id;
        symbols.types.get_mut(a_type).supertype = b_type;
        symbols.types.get_mut(b_type).supertype = a_type;

        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        let missing = resolver.find_member(a_type, "nothing", SymbolFilter::VARIABLE);
        assert!(resolver.symbols.arena.get(missing).is_erroneous());
    }

    #[test]
    fn array_types_expose_length_and_object_members() {
        let (mut symbols, envs, mut completer, _) = resolver_fixture();
        let int_type = symbols.int_type;
        let array_class = symbols.array_class;
        let array_type = symbols
            .types
            .alloc(crate::types::Type::array(int_type, array_class));

        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        let length = resolver.find_member(array_type, "length", SymbolFilter::VARIABLE);
        assert_eq!(resolver.symbols.arena.get(length).name, "length");
        assert_eq!(resolver.symbols.arena.get(length).type_id, resolver.symbols.int_type);
    }

    #[test]
    fn operator_lookup_promotes_small_integrals() {
        let (mut symbols, envs, mut completer, _) = resolver_fixture();
        let byte_type = symbols.byte_type;
        let char_type = symbols.char_type;
        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        let op = resolver.find_operator("+", byte_type, char_type);
        let signature = resolver
            .symbols
            .types
            .get(resolver.symbols.arena.get(op).type_id);
        assert_eq!(signature.result_type, resolver.symbols.int_type);
    }

    #[test]
    fn reference_equality_uses_the_object_operator() {
        let (mut symbols, envs, mut completer, _) = resolver_fixture();
        let string_type = symbols.string_type;
        let null_type = symbols.null_type;
        let mut resolver = Resolver {
            symbols: &mut symbols,
            envs: &envs,
            completer: &mut completer,
        };
        let op = resolver.find_operator("==", string_type, null_type);
        let signature = resolver
            .symbols
            .types
            .get(resolver.symbols.arena.get(op).type_id);
        assert_eq!(signature.result_type, resolver.symbols.boolean_type);
        assert_eq!(
            signature.parameter_types,
            vec![resolver.symbols.object_type, resolver.symbols.object_type]
        );
    }
}
