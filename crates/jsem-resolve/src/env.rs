//! Lexical scope records.
//!
//! Environments form a tree mirroring scope nesting (compilation unit →
//! class → method → block), not the syntax tree itself: only
//! scope-introducing nodes get one, and every other node shares the
//! environment of its nearest scope-introducing ancestor.

use std::fmt;

use crate::symbols::SymbolId;

/// Identity of an environment inside its per-file [`EnvArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EnvId(pub u32);

impl EnvId {
    pub const NONE: EnvId = EnvId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == EnvId::NONE
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "EnvId(NONE)")
        } else {
            write!(f, "EnvId({})", self.0)
        }
    }
}

/// One lexical scope.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Lexically enclosing environment; `NONE` for the compilation unit.
    pub outer: EnvId,
    pub package_symbol: SymbolId,
    /// Enclosing class symbol; `NONE` at compilation-unit level.
    pub enclosing_class: SymbolId,
    /// Enclosing method symbol, if any.
    pub enclosing_method: SymbolId,
    /// Symbols declared directly in this scope, in declaration order.
    pub scope: Vec<SymbolId>,
    /// Single-type imports (fully-qualified names). Compilation-unit
    /// environment only.
    pub named_imports: Vec<String>,
    /// On-demand imports (package prefixes); always contains `java.lang`.
    /// Compilation-unit environment only.
    pub star_imports: Vec<String>,
}

impl Environment {
    pub fn compilation_unit(package_symbol: SymbolId) -> Environment {
        Environment {
            outer: EnvId::NONE,
            package_symbol,
            enclosing_class: SymbolId::NONE,
            enclosing_method: SymbolId::NONE,
            scope: Vec::new(),
            named_imports: Vec::new(),
            star_imports: vec!["java.lang".to_string()],
        }
    }
}

/// Per-file storage for environments.
#[derive(Debug, Default)]
pub struct EnvArena {
    envs: Vec<Environment>,
}

impl EnvArena {
    pub fn new() -> EnvArena {
        EnvArena::default()
    }

    pub fn alloc(&mut self, env: Environment) -> EnvId {
        let id = EnvId(self.envs.len() as u32);
        self.envs.push(env);
        id
    }

    /// New scope nested in `outer`, inheriting its package, class, and
    /// method context.
    pub fn nested(&mut self, outer: EnvId) -> EnvId {
        let parent = self.get(outer);
        let env = Environment {
            outer,
            package_symbol: parent.package_symbol,
            enclosing_class: parent.enclosing_class,
            enclosing_method: parent.enclosing_method,
            scope: Vec::new(),
            named_imports: Vec::new(),
            star_imports: Vec::new(),
        };
        self.alloc(env)
    }

    pub fn get(&self, id: EnvId) -> &Environment {
        &self.envs[id.index()]
    }

    pub fn get_mut(&mut self, id: EnvId) -> &mut Environment {
        &mut self.envs[id.index()]
    }

    pub fn try_get(&self, id: EnvId) -> Option<&Environment> {
        if id.is_none() {
            return None;
        }
        self.envs.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_inherit_context() {
        let mut envs = EnvArena::new();
        let package = SymbolId(7);
        let unit = envs.alloc(Environment::compilation_unit(package));
        let class_env = envs.nested(unit);
        envs.get_mut(class_env).enclosing_class = SymbolId(9);
        let method_env = envs.nested(class_env);

        let method = envs.get(method_env);
        assert_eq!(method.outer, class_env);
        assert_eq!(method.package_symbol, package);
        assert_eq!(method.enclosing_class, SymbolId(9));
        assert!(method.enclosing_method.is_none());
    }
}
