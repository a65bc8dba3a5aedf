//! JSON AST envelope -- canonical serialization with sorted keys, one
//! stable shape per AST node. This is an output stage consumed by
//! golden-file tests and external tooling; the parse facade does not
//! run it.

use crate::ast::{
    Ast, Attribute, Declaration, DefaultValue, EnumConstant, Field, Method, MethodType,
    Namespace, Type,
};
use serde_json::{json, Map, Value};

/// Serialize a compiled AST to the `Bond` envelope: `imports` as
/// strings, `namespaces`, and the root file's `declarations`.
pub fn serialize(ast: &Ast) -> Value {
    let declarations: Vec<Value> = ast
        .roots
        .iter()
        .map(|id| serialize_declaration(ast.arena.get(*id), ast))
        .collect();
    json!({
        "imports": ast.imports,
        "namespaces": ast.namespaces.iter().map(serialize_namespace).collect::<Vec<_>>(),
        "declarations": declarations,
    })
}

fn serialize_namespace(ns: &Namespace) -> Value {
    match ns.lang {
        Some(lang) => json!({ "name": ns.name, "lang": lang.tag() }),
        None => json!({ "name": ns.name }),
    }
}

fn serialize_declaration(decl: &Declaration, ast: &Ast) -> Value {
    let mut m = Map::new();
    m.insert("declName".to_owned(), json!(decl.name()));
    m.insert(
        "declNamespaces".to_owned(),
        json!(decl
            .namespaces()
            .iter()
            .map(serialize_namespace)
            .collect::<Vec<_>>()),
    );

    match decl {
        Declaration::Struct {
            base,
            fields,
            attributes,
            ..
        } => {
            m.insert("tag".to_owned(), json!("Struct"));
            m.insert("declParams".to_owned(), serialize_params(decl));
            if let Some(b) = base {
                m.insert("structBase".to_owned(), serialize_type(b, ast));
            }
            m.insert(
                "structFields".to_owned(),
                json!(fields
                    .iter()
                    .map(|f| serialize_field(f, ast))
                    .collect::<Vec<_>>()),
            );
            insert_attributes(&mut m, attributes);
        }
        Declaration::Enum {
            constants,
            attributes,
            ..
        } => {
            m.insert("tag".to_owned(), json!("Enum"));
            m.insert(
                "enumConstants".to_owned(),
                json!(constants
                    .iter()
                    .map(serialize_constant)
                    .collect::<Vec<_>>()),
            );
            insert_attributes(&mut m, attributes);
        }
        Declaration::Service {
            base,
            methods,
            attributes,
            ..
        } => {
            m.insert("tag".to_owned(), json!("Service"));
            m.insert("declParams".to_owned(), serialize_params(decl));
            if let Some(b) = base {
                m.insert("serviceBase".to_owned(), serialize_type(b, ast));
            }
            m.insert(
                "serviceMethods".to_owned(),
                json!(methods
                    .iter()
                    .map(|mth| serialize_method(mth, ast))
                    .collect::<Vec<_>>()),
            );
            insert_attributes(&mut m, attributes);
        }
        Declaration::Alias { aliased, .. } => {
            m.insert("tag".to_owned(), json!("Alias"));
            m.insert("declParams".to_owned(), serialize_params(decl));
            m.insert("aliasType".to_owned(), serialize_type(aliased, ast));
        }
        Declaration::Forward { .. } => {
            m.insert("tag".to_owned(), json!("Forward"));
            m.insert("declParams".to_owned(), serialize_params(decl));
        }
    }
    Value::Object(m)
}

fn serialize_params(decl: &Declaration) -> Value {
    json!(decl
        .params()
        .iter()
        .map(|p| {
            if p.value_constraint {
                json!({ "name": p.name, "constraint": "value" })
            } else {
                json!({ "name": p.name })
            }
        })
        .collect::<Vec<_>>())
}

fn insert_attributes(m: &mut Map<String, Value>, attributes: &[Attribute]) {
    if attributes.is_empty() {
        return;
    }
    m.insert(
        "declAttributes".to_owned(),
        json!(attributes
            .iter()
            .map(|a| json!({ "name": a.name, "value": a.value }))
            .collect::<Vec<_>>()),
    );
}

fn serialize_field(field: &Field, ast: &Ast) -> Value {
    let mut m = Map::new();
    m.insert("ordinal".to_owned(), json!(field.ordinal));
    m.insert("modifier".to_owned(), json!(field.modifier.keyword()));
    m.insert("type".to_owned(), serialize_type(&field.ty, ast));
    m.insert("name".to_owned(), json!(field.name));
    if let Some(d) = &field.default {
        m.insert("default".to_owned(), serialize_default(d));
    }
    if !field.attributes.is_empty() {
        m.insert(
            "attributes".to_owned(),
            json!(field
                .attributes
                .iter()
                .map(|a| json!({ "name": a.name, "value": a.value }))
                .collect::<Vec<_>>()),
        );
    }
    Value::Object(m)
}

fn serialize_constant(c: &EnumConstant) -> Value {
    json!({ "name": c.name, "value": c.value })
}

fn serialize_method(method: &Method, ast: &Ast) -> Value {
    match method {
        Method::Function {
            name,
            result,
            input,
            ..
        } => json!({
            "tag": "Function",
            "methodName": name,
            "methodResult": serialize_method_type(result, ast),
            "methodInput": serialize_method_type(input, ast),
        }),
        Method::Event { name, input, .. } => json!({
            "tag": "Event",
            "methodName": name,
            "methodInput": serialize_method_type(input, ast),
        }),
    }
}

fn serialize_method_type(mt: &MethodType, ast: &Ast) -> Value {
    match mt {
        MethodType::Void => json!({ "kind": "void" }),
        MethodType::Unary(t) => json!({ "kind": "unary", "type": serialize_type(t, ast) }),
        MethodType::Streaming(t) => {
            json!({ "kind": "streaming", "type": serialize_type(t, ast) })
        }
    }
}

fn serialize_default(d: &DefaultValue) -> Value {
    match d {
        DefaultValue::Bool(v) => json!({ "type": "bool", "value": v }),
        DefaultValue::Integer(v) => json!({ "type": "integer", "value": v }),
        DefaultValue::Float(v) => json!({ "type": "float", "value": v }),
        DefaultValue::String(v) => json!({ "type": "string", "value": v }),
        DefaultValue::Enum(v) => json!({ "type": "enum", "value": v }),
        DefaultValue::Nothing => json!({ "type": "nothing" }),
    }
}

/// Primitive types serialize as bare strings; containers and user
/// types as structured objects.
fn serialize_type(ty: &Type, ast: &Ast) -> Value {
    match ty {
        Type::Int8 => json!("int8"),
        Type::Int16 => json!("int16"),
        Type::Int32 => json!("int32"),
        Type::Int64 => json!("int64"),
        Type::UInt8 => json!("uint8"),
        Type::UInt16 => json!("uint16"),
        Type::UInt32 => json!("uint32"),
        Type::UInt64 => json!("uint64"),
        Type::Float => json!("float"),
        Type::Double => json!("double"),
        Type::Bool => json!("bool"),
        Type::String => json!("string"),
        Type::WString => json!("wstring"),
        Type::Blob => json!("blob"),
        Type::MetaName => json!("bond_meta::name"),
        Type::MetaFullName => json!("bond_meta::full_name"),
        Type::List(t) => json!({ "type": "list", "element": serialize_type(t, ast) }),
        Type::Vector(t) => json!({ "type": "vector", "element": serialize_type(t, ast) }),
        Type::Set(t) => json!({ "type": "set", "key": serialize_type(t, ast) }),
        Type::Map(k, v) => json!({
            "type": "map",
            "key": serialize_type(k, ast),
            "element": serialize_type(v, ast),
        }),
        Type::Nullable(t) => json!({ "type": "nullable", "element": serialize_type(t, ast) }),
        Type::Bonded(t) => json!({ "type": "bonded", "element": serialize_type(t, ast) }),
        Type::Maybe(t) => json!({ "type": "maybe", "element": serialize_type(t, ast) }),
        Type::Parameter(p) => json!({ "type": "parameter", "name": p.name }),
        Type::IntLiteral(n) => json!(n),
        Type::UserDefined { decl, args } => {
            let mut m = Map::new();
            m.insert("type".to_owned(), json!("user"));
            m.insert(
                "declaration".to_owned(),
                json!(ast.arena.get(*decl).qualified_name()),
            );
            if !args.is_empty() {
                m.insert(
                    "arguments".to_owned(),
                    json!(args
                        .iter()
                        .map(|a| serialize_type(a, ast))
                        .collect::<Vec<_>>()),
                );
            }
            Value::Object(m)
        }
        // Finalized ASTs contain no unresolved nodes; serialize the
        // name so a partial AST still dumps.
        Type::Unresolved { name, .. } => json!({ "type": "unresolved", "name": name }),
    }
}
