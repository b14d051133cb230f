//! External symbol completion.
//!
//! Classes outside the current compilation unit are materialized lazily
//! from compiled class metadata found on the configured classpath. The
//! completer is scoped to one analysis run: its cache is shared across all
//! files compiled against the same classpath and released by [`done`].
//!
//! Metadata is a black box to the analyzer. The shipped
//! [`DirectorySource`] reads per-class JSON documents from classpath
//! directories; archive-style sources plug in behind the same
//! [`MetadataSource`] trait.
//!
//! [`done`]: BytecodeCompleter::done

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::symbols::{SymbolId, SymbolKind, Symbols};
use crate::types::{Type, TypeId, TypeTag};

/// Compiled metadata of one class, as read from a classpath entry.
///
/// Type descriptors use source-level names: `int`, `java.lang.String`,
/// `int[]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassMetadata {
    /// Fully-qualified name.
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
    #[serde(default)]
    pub methods: Vec<MethodMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodMetadata {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(rename = "returns", default = "MethodMetadata::default_return")]
    pub return_type: String,
}

impl MethodMetadata {
    fn default_return() -> String {
        "void".to_string()
    }
}

/// One ordered classpath entry the completer can ask for class metadata.
pub trait MetadataSource {
    /// Metadata for a fully-qualified class name, or `None` if this entry
    /// does not provide the class. Read errors are soft: log and return
    /// `None`.
    fn load(&mut self, fully_qualified_name: &str) -> Option<ClassMetadata>;
}

/// Classpath directory of per-class metadata documents.
///
/// `com/example/Foo.class.json` provides `com.example.Foo`. The directory
/// is indexed once at construction; documents are read on demand.
pub struct DirectorySource {
    root: PathBuf,
    index: FxHashMap<String, PathBuf>,
}

const METADATA_SUFFIX: &str = ".class.json";

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> DirectorySource {
        let root = root.into();
        let mut index = FxHashMap::default();
        for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let Some(relative) = relative.to_str() else {
                continue;
            };
            let normalized = relative.replace(std::path::MAIN_SEPARATOR, "/");
            if let Some(stem) = normalized.strip_suffix(METADATA_SUFFIX) {
                let fqn = stem.replace('/', ".");
                index.insert(fqn, entry.path().to_path_buf());
            }
        }
        debug!(root = %root.display(), classes = index.len(), "indexed classpath directory");
        DirectorySource { root, index }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MetadataSource for DirectorySource {
    fn load(&mut self, fully_qualified_name: &str) -> Option<ClassMetadata> {
        let path = self.index.get(fully_qualified_name)?;
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                warn!(class = fully_qualified_name, path = %path.display(), %error,
                    "unreadable class metadata");
                return None;
            }
        };
        match serde_json::from_str::<ClassMetadata>(&text) {
            Ok(metadata) => Some(metadata),
            Err(error) => {
                warn!(class = fully_qualified_name, path = %path.display(), %error,
                    "malformed class metadata");
                None
            }
        }
    }
}

/// Materializes symbols for externally-compiled classes.
///
/// `complete` is total and idempotent: the first call for a name reads
/// metadata and enters the class (with supertypes, fields, and method
/// signatures) into the symbol table; every later call returns the same
/// symbol identity from the cache. A class that cannot be located or read
/// completes to the unknown symbol, which is cached the same way.
pub struct BytecodeCompleter {
    sources: Vec<Box<dyn MetadataSource>>,
    cache: FxHashMap<String, SymbolId>,
    closed: bool,
}

impl BytecodeCompleter {
    pub fn new(sources: Vec<Box<dyn MetadataSource>>) -> BytecodeCompleter {
        BytecodeCompleter {
            sources,
            cache: FxHashMap::default(),
            closed: false,
        }
    }

    /// Completer over directory entries, in classpath order.
    pub fn from_directories(paths: impl IntoIterator<Item = PathBuf>) -> BytecodeCompleter {
        let sources = paths
            .into_iter()
            .map(|path| Box::new(DirectorySource::new(path)) as Box<dyn MetadataSource>)
            .collect();
        BytecodeCompleter::new(sources)
    }

    /// Completer with an empty classpath; every completion yields the
    /// unknown symbol.
    pub fn empty() -> BytecodeCompleter {
        BytecodeCompleter::new(Vec::new())
    }

    /// Resolve a fully-qualified name to a symbol, reading metadata on the
    /// first request. Never fails: missing or unreadable classes complete
    /// to the unknown symbol.
    pub fn complete(&mut self, symbols: &mut Symbols, fully_qualified_name: &str) -> SymbolId {
        if let Some(&cached) = self.cache.get(fully_qualified_name) {
            return cached;
        }
        if self.closed {
            warn!(class = fully_qualified_name, "completion requested after close");
            return symbols.unknown_symbol;
        }
        // A type already in the table wins over the classpath: the
        // predefined java.lang stubs and source-declared classes are never
        // shadowed by compiled ones.
        if let Some(declared) = find_declared(symbols, fully_qualified_name) {
            self.cache
                .insert(fully_qualified_name.to_string(), declared);
            return declared;
        }
        let Some(metadata) = self.locate(fully_qualified_name) else {
            debug!(class = fully_qualified_name, "class not found on classpath");
            self.cache
                .insert(fully_qualified_name.to_string(), symbols.unknown_symbol);
            return symbols.unknown_symbol;
        };

        let (package_name, simple_name) = split_qualified(fully_qualified_name);
        let owner = symbols.enter_package(package_name);
        let class = symbols.enter_class(simple_name, owner);
        // Cache the stub before filling members so recursive references
        // (a field of its own class, cyclic supertypes) terminate.
        self.cache.insert(fully_qualified_name.to_string(), class);

        let class_type = symbols.arena.get(class).type_id;
        let supertype = match &metadata.superclass {
            Some(name) => self.class_type_for(symbols, name),
            None if fully_qualified_name != "java.lang.Object" => symbols.object_type,
            None => TypeId::NONE,
        };
        symbols.types.get_mut(class_type).supertype = supertype;
        let interfaces: Vec<TypeId> = metadata
            .interfaces
            .iter()
            .map(|name| self.class_type_for(symbols, name))
            .collect();
        symbols.types.get_mut(class_type).interfaces = interfaces;

        for field in &metadata.fields {
            let field_type = self.type_for_descriptor(symbols, &field.type_name);
            let symbol = symbols
                .arena
                .alloc(crate::symbols::Symbol::new(SymbolKind::Variable, field.name.as_str(), class));
            symbols.arena.get_mut(symbol).type_id = field_type;
            symbols.arena.get_mut(class).members.push(symbol);
        }
        for method in &metadata.methods {
            let parameter_types: Vec<TypeId> = method
                .parameters
                .iter()
                .map(|descriptor| self.type_for_descriptor(symbols, descriptor))
                .collect();
            let result_type = self.type_for_descriptor(symbols, &method.return_type);
            let method_type = symbols.types.alloc(Type::method(parameter_types, result_type));
            let symbol = symbols
                .arena
                .alloc(crate::symbols::Symbol::new(SymbolKind::Method, method.name.as_str(), class));
            symbols.arena.get_mut(symbol).type_id = method_type;
            symbols.arena.get_mut(class).members.push(symbol);
        }

        debug!(class = fully_qualified_name, "completed external class");
        class
    }

    /// Release the cache and classpath entries (and any file handles they
    /// hold). Called once when the analysis run ends.
    pub fn done(&mut self) {
        debug!(cached = self.cache.len(), "closing bytecode completer");
        self.cache.clear();
        self.sources.clear();
        self.closed = true;
    }

    fn locate(&mut self, fully_qualified_name: &str) -> Option<ClassMetadata> {
        for source in &mut self.sources {
            if let Some(metadata) = source.load(fully_qualified_name) {
                return Some(metadata);
            }
        }
        None
    }

    /// Class type for a referenced class name; unknown-type when the class
    /// itself cannot be completed.
    fn class_type_for(&mut self, symbols: &mut Symbols, name: &str) -> TypeId {
        let symbol = self.complete(symbols, name);
        if symbols.arena.get(symbol).is_erroneous() {
            symbols.unknown_type
        } else {
            symbols.arena.get(symbol).type_id
        }
    }

    /// Type for a source-level descriptor: primitives, `Fqn[]` arrays, or
    /// class names.
    fn type_for_descriptor(&mut self, symbols: &mut Symbols, descriptor: &str) -> TypeId {
        if let Some(element) = descriptor.strip_suffix("[]") {
            let element_type = self.type_for_descriptor(symbols, element);
            let array_class = symbols.array_class;
            return symbols.types.alloc(Type::array(element_type, array_class));
        }
        if let Some(primitive) = symbols.primitive_by_name(descriptor) {
            return primitive;
        }
        let class_type = self.class_type_for(symbols, descriptor);
        if symbols.types.get(class_type).tag == TypeTag::Class {
            class_type
        } else {
            symbols.unknown_type
        }
    }
}

fn find_declared(symbols: &Symbols, fully_qualified_name: &str) -> Option<SymbolId> {
    let (package_name, simple_name) = split_qualified(fully_qualified_name);
    let package = symbols.lookup_package(package_name)?;
    symbols
        .arena
        .get(package)
        .members
        .iter()
        .copied()
        .find(|&member| {
            let sym = symbols.arena.get(member);
            sym.kind == SymbolKind::Type && sym.name == simple_name
        })
}

pub(crate) fn split_qualified(fully_qualified_name: &str) -> (&str, &str) {
    match fully_qualified_name.rfind('.') {
        Some(dot) => (
            &fully_qualified_name[..dot],
            &fully_qualified_name[dot + 1..],
        ),
        None => ("", fully_qualified_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_qualified_handles_default_package() {
        assert_eq!(split_qualified("Foo"), ("", "Foo"));
        assert_eq!(split_qualified("java.util.List"), ("java.util", "List"));
    }

    #[test]
    fn empty_classpath_completes_to_unknown() {
        let mut symbols = Symbols::new();
        let mut completer = BytecodeCompleter::empty();
        let symbol = completer.complete(&mut symbols, "com.example.Missing");
        assert_eq!(symbol, symbols.unknown_symbol);
        // The failure is cached; the identity stays stable.
        let again = completer.complete(&mut symbols, "com.example.Missing");
        assert_eq!(again, symbol);
    }

    #[test]
    fn predefined_stubs_win_over_the_classpath() {
        let mut symbols = Symbols::new();
        let mut completer = BytecodeCompleter::empty();
        let string = completer.complete(&mut symbols, "java.lang.String");
        assert_eq!(symbols.arena.get(string).type_id, symbols.string_type);
    }

    #[test]
    fn completion_after_close_is_soft() {
        let mut symbols = Symbols::new();
        let mut completer = BytecodeCompleter::empty();
        completer.done();
        let symbol = completer.complete(&mut symbols, "com.example.Late");
        assert_eq!(symbol, symbols.unknown_symbol);
    }
}
