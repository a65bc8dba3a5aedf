//! End-to-end compatibility scenarios: compile two schema texts, diff,
//! and assert on the classified change set.

use bond_compat::{check_compatibility, ChangeCategory, SchemaChange};
use bond_core::{parse_string, Ast};

fn compile(src: &str) -> Ast {
    let result = parse_string(src);
    assert!(result.success, "compile failed: {:?}", result.errors);
    result.ast.unwrap()
}

fn diff(old: &str, new: &str) -> Vec<SchemaChange> {
    check_compatibility(&compile(old), &compile(new))
}

fn breaking_wire(changes: &[SchemaChange]) -> Vec<&SchemaChange> {
    changes
        .iter()
        .filter(|c| c.category == ChangeCategory::BreakingWire)
        .collect()
}

#[test]
fn identical_schemas_produce_an_empty_change_set() {
    let src = "namespace t\nenum E { A, B = 5 }\nusing Items = vector<int32>;\nstruct U : t.Base { 0: required string id; 1: optional E e = A; }\nstruct Base {}\nservice S { void Ping(); }";
    let changes = diff(src, src);
    assert!(changes.is_empty(), "expected empty set, got {:?}", changes);
}

#[test]
fn diffing_is_deterministic_across_invocations() {
    let old = "namespace t\nstruct U { 0: required string id; 1: optional int32 n; }";
    let new = "namespace t\nstruct U { 0: required string key; 2: required int32 m; }";
    let first = diff(old, new);
    let second = diff(old, new);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn adding_an_optional_field_is_compatible() {
    let changes = diff(
        "namespace T\nstruct U { 0: required string id; }",
        "namespace T\nstruct U { 0: required string id; 1: optional string email; }",
    );
    assert_eq!(changes.len(), 1, "changes: {:?}", changes);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
    assert!(changes[0].description.contains("email"));
}

#[test]
fn adding_a_required_field_breaks_the_wire() {
    let changes = diff(
        "namespace T\nstruct U { 0: required string id; }",
        "namespace T\nstruct U { 0: required string id; 1: required string email; }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingWire);
}

#[test]
fn changing_an_ordinal_is_a_remove_plus_add() {
    let changes = diff(
        "namespace t\nstruct U { 0: required string id; }",
        "namespace t\nstruct U { 1: required string id; }",
    );
    assert_eq!(changes.len(), 2, "changes: {:?}", changes);
    assert!(changes
        .iter()
        .all(|c| c.category == ChangeCategory::BreakingWire));
    assert!(changes.iter().any(|c| c.description.contains("removed")));
    assert!(changes.iter().any(|c| c.description.contains("added")));
}

#[test]
fn removing_an_optional_field_is_compatible() {
    let changes = diff(
        "namespace t\nstruct U { 0: required string id; 1: optional int32 n; }",
        "namespace t\nstruct U { 0: required string id; }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
    assert!(changes[0].description.contains("removed"));
}

#[test]
fn vector_to_list_is_a_single_compatible_change() {
    let changes = diff(
        "namespace t\nstruct U { 0: required vector<string> tags; }",
        "namespace t\nstruct U { 0: required list<string> tags; }",
    );
    assert_eq!(changes.len(), 1, "changes: {:?}", changes);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
    assert!(changes[0].description.contains("vector"));
    assert!(changes[0].description.contains("list"));
    assert!(breaking_wire(&changes).is_empty());
}

#[test]
fn renaming_a_field_breaks_text_protocols_only() {
    let changes = diff(
        "namespace t\nstruct U { 0: required string id; }",
        "namespace t\nstruct U { 0: required string key; }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingText);
    assert!(changes[0].description.contains("'id'"));
    assert!(changes[0].description.contains("'key'"));
}

#[test]
fn direct_optional_required_flip_breaks_the_wire() {
    let changes = diff(
        "namespace t\nstruct U { 0: optional string id; }",
        "namespace t\nstruct U { 0: required string id; }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingWire);
    assert!(changes[0]
        .recommendation
        .as_deref()
        .unwrap()
        .contains("required_optional"));
}

#[test]
fn modifier_path_through_required_optional_is_compatible() {
    let to_intermediate = diff(
        "namespace t\nstruct U { 0: optional string id; }",
        "namespace t\nstruct U { 0: required_optional string id; }",
    );
    assert_eq!(to_intermediate.len(), 1);
    assert_eq!(to_intermediate[0].category, ChangeCategory::Compatible);
    assert!(to_intermediate[0].recommendation.is_some());

    let from_intermediate = diff(
        "namespace t\nstruct U { 0: required_optional string id; }",
        "namespace t\nstruct U { 0: required string id; }",
    );
    assert_eq!(from_intermediate.len(), 1);
    assert_eq!(from_intermediate[0].category, ChangeCategory::Compatible);
}

#[test]
fn default_value_change_breaks_the_wire() {
    let changes = diff(
        "namespace t\nstruct U { 0: optional int32 n = 1; }",
        "namespace t\nstruct U { 0: optional int32 n = 2; }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingWire);
    assert!(changes[0].description.contains("default"));
}

#[test]
fn numeric_widening_is_compatible_narrowing_is_not() {
    let widen = diff(
        "namespace t\nstruct U { 0: optional int16 n; }",
        "namespace t\nstruct U { 0: optional int64 n; }",
    );
    assert_eq!(widen.len(), 1);
    assert_eq!(widen[0].category, ChangeCategory::Compatible);

    let narrow = diff(
        "namespace t\nstruct U { 0: optional int64 n; }",
        "namespace t\nstruct U { 0: optional int16 n; }",
    );
    assert_eq!(narrow.len(), 1);
    assert_eq!(narrow[0].category, ChangeCategory::BreakingWire);
}

#[test]
fn base_type_change_breaks_the_wire() {
    let changes = diff(
        "namespace t\nstruct A {}\nstruct B {}\nstruct U : A { 0: optional int32 n; }",
        "namespace t\nstruct A {}\nstruct B {}\nstruct U : B { 0: optional int32 n; }",
    );
    let wire = breaking_wire(&changes);
    assert_eq!(wire.len(), 1, "changes: {:?}", changes);
    assert!(wire[0].description.contains("Inheritance"));
}

#[test]
fn removing_the_base_breaks_the_wire() {
    let changes = diff(
        "namespace t\nstruct A {}\nstruct U : A { }",
        "namespace t\nstruct A {}\nstruct U { }",
    );
    assert_eq!(breaking_wire(&changes).len(), 1);
}

#[test]
fn enum_middle_insertion_without_value_is_breaking() {
    let changes = diff(
        "namespace t\nenum S { A, B, C }",
        "namespace t\nenum S { A, X, B, C }",
    );
    let wire = breaking_wire(&changes);
    assert!(!wire.is_empty(), "changes: {:?}", changes);
    // X shifts B and C; the insertion itself and the shifted constants
    // are all wire-breaking.
    assert!(changes.iter().any(|c| c.description.contains("'X'")));
    assert!(changes
        .iter()
        .any(|c| c.description.contains("'B'") && c.description.contains("changed")));
}

#[test]
fn enum_append_is_compatible() {
    let changes = diff(
        "namespace t\nenum S { A, B }",
        "namespace t\nenum S { A, B, C }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
}

#[test]
fn enum_insertion_with_explicit_value_is_compatible() {
    let changes = diff(
        "namespace t\nenum S { A, B = 5 }",
        "namespace t\nenum S { A, X = 100, B = 5 }",
    );
    assert_eq!(changes.len(), 1, "changes: {:?}", changes);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
}

#[test]
fn enum_constant_removal_is_breaking() {
    let changes = diff(
        "namespace t\nenum S { A, B }",
        "namespace t\nenum S { A }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingWire);
}

#[test]
fn enum_explicit_value_change_is_breaking() {
    let changes = diff(
        "namespace t\nenum S { A = 1 }",
        "namespace t\nenum S { A = 2 }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingWire);
    assert!(changes[0].description.contains("1"));
    assert!(changes[0].description.contains("2"));
}

#[test]
fn alias_vector_to_list_is_not_breaking() {
    let changes = diff(
        "namespace t\nusing Items = vector<int32>;",
        "namespace t\nusing Items = list<int32>;",
    );
    assert!(breaking_wire(&changes).is_empty(), "changes: {:?}", changes);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
}

#[test]
fn alias_type_change_to_unrelated_type_is_breaking() {
    let changes = diff(
        "namespace t\nusing Items = vector<int32>;",
        "namespace t\nusing Items = string;",
    );
    assert_eq!(breaking_wire(&changes).len(), 1);
}

#[test]
fn declaration_removal_and_addition() {
    let changes = diff(
        "namespace t\nstruct A {}\nstruct B {}",
        "namespace t\nstruct A {}\nstruct C {}",
    );
    assert_eq!(changes.len(), 2);
    assert!(changes
        .iter()
        .any(|c| c.category == ChangeCategory::BreakingWire && c.description.contains("'t.B'")));
    assert!(changes
        .iter()
        .any(|c| c.category == ChangeCategory::Compatible && c.description.contains("'t.C'")));
}

#[test]
fn declaration_kind_change_is_breaking() {
    let changes = diff(
        "namespace t\nstruct X {}",
        "namespace t\nenum X { A }",
    );
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::BreakingWire);
    assert!(changes[0].description.contains("struct"));
    assert!(changes[0].description.contains("enum"));
}

#[test]
fn service_method_removal_is_breaking_addition_is_not() {
    let changes = diff(
        "namespace t\nservice S { void Ping(); void Obsolete(); }",
        "namespace t\nservice S { void Ping(); void Fresh(); }",
    );
    assert_eq!(changes.len(), 2, "changes: {:?}", changes);
    assert!(changes
        .iter()
        .any(|c| c.category == ChangeCategory::BreakingWire
            && c.description.contains("Obsolete")));
    assert!(changes
        .iter()
        .any(|c| c.category == ChangeCategory::Compatible && c.description.contains("Fresh")));
}

#[test]
fn service_signature_change_is_breaking() {
    let changes = diff(
        "namespace t\nstruct P {}\nservice S { void Call(P p); }",
        "namespace t\nstruct P {}\nservice S { void Call(stream P p); }",
    );
    let wire = breaking_wire(&changes);
    assert_eq!(wire.len(), 1, "changes: {:?}", changes);
    assert!(wire[0].description.contains("signature"));
}

#[test]
fn service_base_change_is_breaking() {
    let changes = diff(
        "namespace t\nservice A {}\nservice B {}\nservice S : A { }",
        "namespace t\nservice A {}\nservice B {}\nservice S : B { }",
    );
    assert_eq!(breaking_wire(&changes).len(), 1);
}

#[test]
fn bonded_wrap_change_is_compatible() {
    let changes = diff(
        "namespace t\nstruct P {}\nstruct U { 0: optional bonded<P> p; }",
        "namespace t\nstruct P {}\nstruct U { 0: optional P p; }",
    );
    assert_eq!(changes.len(), 1, "changes: {:?}", changes);
    assert_eq!(changes[0].category, ChangeCategory::Compatible);
}

#[test]
fn every_compatible_pair_produces_no_breaking_wire_entry() {
    let pairs = [
        ("blob", "vector<int8>"),
        ("blob", "list<int8>"),
        ("vector<int8>", "blob"),
        ("float", "double"),
        ("uint8", "uint64"),
        ("uint16", "uint32"),
        ("int8", "int32"),
        ("int32", "int64"),
    ];
    for (old_ty, new_ty) in pairs {
        let old = format!("namespace t\nstruct U {{ 0: optional {} f; }}", old_ty);
        let new = format!("namespace t\nstruct U {{ 0: optional {} f; }}", new_ty);
        let changes = diff(&old, &new);
        assert!(
            breaking_wire(&changes).is_empty(),
            "{} -> {} flagged as breaking: {:?}",
            old_ty,
            new_ty,
            changes
        );
        assert!(
            changes.len() <= 1,
            "{} -> {} produced extra changes: {:?}",
            old_ty,
            new_ty,
            changes
        );
    }
}

#[test]
fn changes_serialize_for_tooling() {
    let changes = diff(
        "namespace t\nstruct U { 0: required string id; }",
        "namespace t\nstruct U { 0: required string key; }",
    );
    let json = serde_json::to_value(&changes).unwrap();
    assert_eq!(json[0]["category"], "BreakingText");
    assert_eq!(json[0]["location"]["file"], "<string>");
}
