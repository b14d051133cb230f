//! External symbol completion against classpath fixtures.

mod common;

use std::path::PathBuf;

use common::{TreeBuilder, analyze_with};
use jsem_resolve::{BytecodeCompleter, SymbolId, Symbols, TypeTag};
use serde_json::json;
use tempfile::TempDir;

/// Classpath directory with one metadata document per `(fqn, document)`.
fn classpath(entries: &[(&str, serde_json::Value)]) -> TempDir {
    let dir = tempfile::tempdir().expect("temp classpath");
    for (fqn, document) in entries {
        let relative = format!("{}.class.json", fqn.replace('.', "/"));
        let path = dir.path().join(relative);
        std::fs::create_dir_all(path.parent().expect("parent dir")).expect("class dirs");
        std::fs::write(&path, serde_json::to_vec_pretty(document).expect("json"))
            .expect("write metadata");
    }
    dir
}

fn member_named(symbols: &Symbols, class: SymbolId, name: &str) -> SymbolId {
    symbols
        .arena
        .get(class)
        .members
        .iter()
        .copied()
        .find(|&member| symbols.arena.get(member).name == name)
        .unwrap_or_else(|| panic!("no member {name}"))
}

#[test]
fn completes_a_class_with_fields_and_methods() {
    let dir = classpath(&[(
        "com.example.Point",
        json!({
            "name": "com.example.Point",
            "fields": [{"name": "x", "type": "int"}],
            "methods": [{"name": "getX", "returns": "int"},
                        {"name": "translate", "parameters": ["int", "int"]}]
        }),
    )]);
    let mut symbols = Symbols::new();
    let mut completer = BytecodeCompleter::from_directories([dir.path().to_path_buf()]);

    let point = completer.complete(&mut symbols, "com.example.Point");
    assert!(!symbols.arena.get(point).is_erroneous());
    assert_eq!(symbols.full_name(point), "com.example.Point");

    let x = member_named(&symbols, point, "x");
    assert_eq!(symbols.arena.get(x).type_id, symbols.int_type);

    let get_x = member_named(&symbols, point, "getX");
    let signature = symbols.types.get(symbols.arena.get(get_x).type_id);
    assert_eq!(signature.tag, TypeTag::Method);
    assert_eq!(signature.result_type, symbols.int_type);

    // An omitted return type reads as void.
    let translate = member_named(&symbols, point, "translate");
    let signature = symbols.types.get(symbols.arena.get(translate).type_id);
    assert_eq!(signature.parameter_types, vec![symbols.int_type, symbols.int_type]);
    assert_eq!(signature.result_type, symbols.void_type);

    // Completion is idempotent: the same identity every time.
    assert_eq!(completer.complete(&mut symbols, "com.example.Point"), point);
    // The owning package chain was materialized.
    assert!(symbols.lookup_package("com.example").is_some());
}

#[test]
fn array_descriptors_complete_to_array_types() {
    let dir = classpath(&[(
        "com.example.Names",
        json!({
            "name": "com.example.Names",
            "fields": [{"name": "values", "type": "java.lang.String[]"}]
        }),
    )]);
    let mut symbols = Symbols::new();
    let mut completer = BytecodeCompleter::from_directories([dir.path().to_path_buf()]);

    let names = completer.complete(&mut symbols, "com.example.Names");
    let values = member_named(&symbols, names, "values");
    let value_type = symbols.types.get(symbols.arena.get(values).type_id);
    assert_eq!(value_type.tag, TypeTag::Array);
    // The element resolves to the predefined String stub, not a classpath
    // lookup.
    assert_eq!(value_type.element_type, symbols.string_type);
}

#[test]
fn malformed_metadata_is_a_soft_failure() {
    let dir = tempfile::tempdir().expect("temp classpath");
    let path = dir.path().join("com/example/Bad.class.json");
    std::fs::create_dir_all(path.parent().expect("parent dir")).expect("class dirs");
    std::fs::write(&path, b"{ not json").expect("write metadata");

    let mut symbols = Symbols::new();
    let mut completer =
        BytecodeCompleter::from_directories([dir.path().to_path_buf()]);
    let bad = completer.complete(&mut symbols, "com.example.Bad");
    assert!(symbols.arena.get(bad).is_erroneous());
    assert_eq!(bad, symbols.unknown_symbol);
}

#[test]
fn earlier_classpath_entries_win() {
    let first = classpath(&[(
        "com.example.Dup",
        json!({"name": "com.example.Dup", "fields": [{"name": "v", "type": "int"}]}),
    )]);
    let second = classpath(&[(
        "com.example.Dup",
        json!({"name": "com.example.Dup", "fields": [{"name": "v", "type": "long"}]}),
    )]);
    let mut symbols = Symbols::new();
    let mut completer = BytecodeCompleter::from_directories([
        PathBuf::from(first.path()),
        PathBuf::from(second.path()),
    ]);

    let dup = completer.complete(&mut symbols, "com.example.Dup");
    let v = member_named(&symbols, dup, "v");
    assert_eq!(symbols.arena.get(v).type_id, symbols.int_type);
}

#[test]
fn named_import_resolves_through_the_classpath() {
    // import com.example.Point; class C { void m(Point p) { p.x; } }
    let dir = classpath(&[(
        "com.example.Point",
        json!({
            "name": "com.example.Point",
            "fields": [{"name": "x", "type": "int"}]
        }),
    )]);
    let mut completer = BytecodeCompleter::from_directories([dir.path().to_path_buf()]);

    let mut b = TreeBuilder::new();
    let point_type = b.ident("Point");
    let parameter = b.variable("p", point_type, None);
    let p_ref = b.ident("p");
    let (select, x_ref) = b.select(p_ref, "x");
    let statement = b.expr_stmt(select);
    let void = b.primitive("void");
    let method = b.method("m", Some(void), vec![parameter], vec![statement]);
    let class = b.class("C", vec![method]);
    let unit = b.unit_in(None, &[("com.example.Point", false)], vec![class]);
    let (symbols, model) = analyze_with(&b.arena, unit, &mut completer);

    assert_eq!(model.type_at(select), Some(symbols.int_type));
    let x_symbol = model.reference_at(x_ref).expect("field reference");
    assert_eq!(symbols.full_name(x_symbol), "com.example.Point.x");
}

#[test]
fn on_demand_import_resolves_through_the_classpath() {
    // import com.example.*; class C { void m(Point p) { } }
    let dir = classpath(&[(
        "com.example.Point",
        json!({"name": "com.example.Point"}),
    )]);
    let mut completer = BytecodeCompleter::from_directories([dir.path().to_path_buf()]);

    let mut b = TreeBuilder::new();
    let point_type = b.ident("Point");
    let parameter = b.variable("p", point_type, None);
    let void = b.primitive("void");
    let method = b.method("m", Some(void), vec![parameter], vec![]);
    let class = b.class("C", vec![method]);
    let unit = b.unit_in(None, &[("com.example", true)], vec![class]);
    let (symbols, model) = analyze_with(&b.arena, unit, &mut completer);

    let point = model.reference_at(point_type).expect("type reference");
    assert_eq!(symbols.full_name(point), "com.example.Point");
}

#[test]
fn external_supertype_members_are_visible() {
    // import com.example.Derived; class C { int m(Derived d) { return d.n; } }
    let dir = classpath(&[
        (
            "com.example.Base",
            json!({
                "name": "com.example.Base",
                "fields": [{"name": "n", "type": "int"}]
            }),
        ),
        (
            "com.example.Derived",
            json!({
                "name": "com.example.Derived",
                "superclass": "com.example.Base"
            }),
        ),
    ]);
    let mut completer = BytecodeCompleter::from_directories([dir.path().to_path_buf()]);

    let mut b = TreeBuilder::new();
    let derived_type = b.ident("Derived");
    let parameter = b.variable("d", derived_type, None);
    let d_ref = b.ident("d");
    let (select, n_ref) = b.select(d_ref, "n");
    let ret = b.ret(Some(select));
    let int_type = b.primitive("int");
    let method = b.method("m", Some(int_type), vec![parameter], vec![ret]);
    let class = b.class("C", vec![method]);
    let unit = b.unit_in(None, &[("com.example.Derived", false)], vec![class]);
    let (symbols, model) = analyze_with(&b.arena, unit, &mut completer);

    assert_eq!(model.type_at(select), Some(symbols.int_type));
    let n_symbol = model.reference_at(n_ref).expect("inherited field");
    assert_eq!(symbols.full_name(n_symbol), "com.example.Base.n");
}
