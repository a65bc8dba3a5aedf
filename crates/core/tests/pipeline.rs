//! End-to-end pipeline tests: real files on disk, transitive and
//! circular imports, and the invariants that hold on every finalized
//! AST.

use bond_core::ast::effective_values;
use bond_core::{
    parse_file, parse_string, Ast, Declaration, ErrorKind, Modifier, Type,
};
use std::io::Write;
use std::path::PathBuf;

fn write_schema(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn compile(src: &str) -> Ast {
    let result = parse_string(src);
    assert!(result.success, "errors: {:?}", result.errors);
    result.ast.unwrap()
}

fn assert_no_unresolved(ast: &Ast) {
    fn walk(ty: &Type) {
        match ty {
            Type::Unresolved { name, .. } => panic!("unresolved node '{}' survived", name),
            Type::List(t)
            | Type::Vector(t)
            | Type::Set(t)
            | Type::Nullable(t)
            | Type::Bonded(t)
            | Type::Maybe(t) => walk(t),
            Type::Map(k, v) => {
                walk(k);
                walk(v);
            }
            Type::UserDefined { args, .. } => args.iter().for_each(walk),
            _ => {}
        }
    }
    for (_, decl) in ast.arena.iter() {
        match decl {
            Declaration::Struct { base, fields, .. } => {
                if let Some(b) = base {
                    walk(b);
                }
                fields.iter().for_each(|f| walk(&f.ty));
            }
            Declaration::Service { base, methods, .. } => {
                if let Some(b) = base {
                    walk(b);
                }
                for m in methods {
                    match m.input() {
                        bond_core::MethodType::Unary(t)
                        | bond_core::MethodType::Streaming(t) => walk(t),
                        bond_core::MethodType::Void => {}
                    }
                }
            }
            Declaration::Alias { aliased, .. } => walk(aliased),
            _ => {}
        }
    }
}

#[test]
fn transitive_imports_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        &dir,
        "base.bond",
        "namespace shop\nstruct Money { 0: optional int64 cents; }",
    );
    write_schema(
        &dir,
        "item.bond",
        "import \"base.bond\"\nnamespace shop\nstruct Item { 0: optional shop.Money price; }",
    );
    let main = write_schema(
        &dir,
        "order.bond",
        "import \"item.bond\"\nnamespace shop\nstruct Order { 0: optional vector<shop.Item> items; }",
    );

    let result = parse_file(&main);
    assert!(result.success, "errors: {:?}", result.errors);
    let ast = result.ast.unwrap();
    assert_eq!(ast.roots.len(), 1);
    assert_eq!(ast.arena.len(), 3);
    assert_no_unresolved(&ast);
}

#[test]
fn circular_imports_on_disk_terminate() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        &dir,
        "a.bond",
        "import \"b.bond\"\nnamespace t\nstruct A { 0: optional t.B b; }",
    );
    let b = write_schema(
        &dir,
        "b.bond",
        "import \"a.bond\"\nnamespace t\nstruct B { }",
    );
    // Compile B, which pulls A, which re-imports B: must terminate with
    // a non-null result.
    let result = parse_file(&b);
    assert!(result.ast.is_some());
    assert!(result.success, "errors: {:?}", result.errors);
}

#[test]
fn struct_fields_are_sorted_and_ordinals_unique() {
    let ast = compile(
        "namespace t\nstruct S {\n 9: optional int32 z;\n 1: optional int32 a;\n 4: optional int32 m;\n}",
    );
    for id in &ast.roots {
        if let Declaration::Struct { fields, .. } = ast.arena.get(*id) {
            let ordinals: Vec<u16> = fields.iter().map(|f| f.ordinal).collect();
            let mut sorted = ordinals.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(ordinals, sorted);
        }
    }
}

#[test]
fn enum_implicit_values_follow_previous_plus_one() {
    let ast = compile("namespace t\nenum E { A, B = 7, C, D = -2, F }");
    match ast.arena.get(ast.roots[0]) {
        Declaration::Enum { constants, .. } => {
            assert_eq!(effective_values(constants), vec![0, 7, 8, -2, -1]);
        }
        other => panic!("expected enum, got {:?}", other),
    }
}

#[test]
fn a_realistic_schema_compiles_clean() {
    let ast = compile(
        r#"namespace cpp warehouse
namespace csharp Warehouse

using Id = uint64;
using Tags = set<string>;

enum Status { Unknown, Active = 10, Retired }

struct Audit {
    0: optional bond_meta::full_name source;
    1: optional uint64 at;
}

struct Record : warehouse.Audit {
    0: required Id key;
    1: optional Status status = Unknown;
    2: optional Tags tags;
    3: optional nullable<Record> previous;
    4: optional map<string, vector<double>> metrics = nothing;
    5: optional blob payload;
}

service Registry {
    Record Fetch(Record query);
    void Purge();
    nothing Touched(Record);
    stream Record Watch(stream Record r);
}
"#,
    );
    assert_no_unresolved(&ast);
    assert_eq!(ast.namespaces.len(), 2);
    assert_eq!(ast.roots.len(), 6);

    // The self-reference in `previous` went through a synthesized
    // forward, so the arena grew past the root declarations.
    assert!(ast.arena.len() > 6);
}

#[test]
fn generic_struct_with_constraint_compiles() {
    let ast = compile(
        "namespace t\nstruct Box<T : value> {\n 0: optional T item;\n 1: optional vector<T> more;\n}",
    );
    match ast.arena.get(ast.roots[0]) {
        Declaration::Struct { params, fields, .. } => {
            assert!(params[0].value_constraint);
            assert!(matches!(&fields[0].ty, Type::Parameter(p) if p.name == "T"));
        }
        other => panic!("expected struct, got {:?}", other),
    }
}

#[test]
fn required_field_modifiers_survive_the_pipeline() {
    let ast = compile(
        "namespace t\nstruct S { 0: required string a; 1: required_optional string b; 2: optional string c; }",
    );
    match ast.arena.get(ast.roots[0]) {
        Declaration::Struct { fields, .. } => {
            assert_eq!(fields[0].modifier, Modifier::Required);
            assert_eq!(fields[1].modifier, Modifier::RequiredOptional);
            assert_eq!(fields[2].modifier, Modifier::Optional);
        }
        other => panic!("expected struct, got {:?}", other),
    }
}

#[test]
fn duplicate_declarations_across_files_conflict() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        &dir,
        "one.bond",
        "namespace t\nstruct Thing { 0: optional int32 a; }",
    );
    let main = write_schema(
        &dir,
        "main.bond",
        "import \"one.bond\"\nnamespace t\nstruct Thing { 0: optional string b; }",
    );
    let result = parse_file(&main);
    assert!(!result.success);
    assert!(result
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::DuplicateDeclaration));
    assert!(result.ast.is_some(), "partial AST expected");
}

#[test]
fn forward_across_files_reconciles_with_definition() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(&dir, "fwd.bond", "namespace t\nstruct Widget;");
    let main = write_schema(
        &dir,
        "main.bond",
        "import \"fwd.bond\"\nnamespace t\nstruct Widget { 0: optional int32 id; }\nstruct Panel { 0: optional t.Widget w; }",
    );
    let result = parse_file(&main);
    assert!(result.success, "errors: {:?}", result.errors);
    let ast = result.ast.unwrap();

    let panel = ast
        .roots
        .iter()
        .map(|id| ast.arena.get(*id))
        .find(|d| d.name() == "Panel")
        .expect("struct Panel");
    match panel {
        Declaration::Struct { fields, .. } => match &fields[0].ty {
            Type::UserDefined { decl, .. } => {
                assert_eq!(ast.arena.get(*decl).kind(), "struct");
            }
            other => panic!("expected user type, got {:?}", other),
        },
        other => panic!("expected struct, got {:?}", other),
    }
}

#[test]
fn errors_from_multiple_declarations_accumulate_in_one_run() {
    let result = parse_string(
        "namespace t\nenum E { A, A }\nstruct S { 0: optional int32 a; 0: optional int32 b; }\nservice V { void X(); void X(); }",
    );
    assert!(!result.success);
    let kinds: Vec<ErrorKind> = result.errors.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&ErrorKind::DuplicateConstant));
    assert!(kinds.contains(&ErrorKind::DuplicateOrdinal));
    assert!(kinds.contains(&ErrorKind::DuplicateMethod));
}

#[test]
fn wide_strings_and_escapes_reach_defaults() {
    let ast = compile(
        "namespace t\nstruct S { 0: optional wstring w = L\"wide\\t\\u0041\"; }",
    );
    match ast.arena.get(ast.roots[0]) {
        Declaration::Struct { fields, .. } => {
            assert_eq!(
                fields[0].default,
                Some(bond_core::DefaultValue::String("wide\tA".to_owned()))
            );
        }
        other => panic!("expected struct, got {:?}", other),
    }
}

#[test]
fn hidden_channel_preserves_comments_for_the_formatter() {
    let out = bond_core::lexer::lex("// license\nnamespace t // inline\n/* block */ struct S {}");
    let comments: Vec<&str> = out
        .trivia
        .iter()
        .filter(|t| t.kind != bond_core::lexer::TriviaKind::Whitespace)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(comments, vec!["// license", "// inline", "/* block */"]);
}
