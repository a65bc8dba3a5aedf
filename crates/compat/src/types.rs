//! Type comparison across two independently compiled ASTs: structural
//! equality, display names for descriptions, and the wire-level change
//! classification.

use bond_core::{flatten_type, Ast, Declaration, Type};

/// Result of classifying a type change after structural equality has
/// been ruled out at the call site.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TypeChange {
    Equal,
    Compatible { recommendation: Option<String> },
    Breaking,
}

/// Structural equality across arenas. `UserDefined` references compare
/// by qualified declaration name and, recursively, type arguments;
/// arena indices mean nothing across two compilations.
pub(crate) fn type_eq(old: &Type, old_ast: &Ast, new: &Type, new_ast: &Ast) -> bool {
    match (old, new) {
        (Type::List(a), Type::List(b))
        | (Type::Vector(a), Type::Vector(b))
        | (Type::Set(a), Type::Set(b))
        | (Type::Nullable(a), Type::Nullable(b))
        | (Type::Bonded(a), Type::Bonded(b))
        | (Type::Maybe(a), Type::Maybe(b)) => type_eq(a, old_ast, b, new_ast),
        (Type::Map(ak, av), Type::Map(bk, bv)) => {
            type_eq(ak, old_ast, bk, new_ast) && type_eq(av, old_ast, bv, new_ast)
        }
        (
            Type::UserDefined { decl: a, args: aa },
            Type::UserDefined { decl: b, args: ba },
        ) => {
            old_ast.arena.get(*a).qualified_name() == new_ast.arena.get(*b).qualified_name()
                && aa.len() == ba.len()
                && aa
                    .iter()
                    .zip(ba.iter())
                    .all(|(x, y)| type_eq(x, old_ast, y, new_ast))
        }
        (Type::Parameter(a), Type::Parameter(b)) => a.name == b.name,
        (Type::IntLiteral(a), Type::IntLiteral(b)) => a == b,
        (Type::Unresolved { name: a, args: aa }, Type::Unresolved { name: b, args: ba }) => {
            a == b
                && aa.len() == ba.len()
                && aa
                    .iter()
                    .zip(ba.iter())
                    .all(|(x, y)| type_eq(x, old_ast, y, new_ast))
        }
        _ => std::mem::discriminant(old) == std::mem::discriminant(new) && is_leaf(old),
    }
}

fn is_leaf(ty: &Type) -> bool {
    !matches!(
        ty,
        Type::List(_)
            | Type::Vector(_)
            | Type::Set(_)
            | Type::Map(..)
            | Type::Nullable(_)
            | Type::Bonded(_)
            | Type::Maybe(_)
            | Type::UserDefined { .. }
            | Type::Parameter(_)
            | Type::IntLiteral(_)
            | Type::Unresolved { .. }
    )
}

/// Human-readable type spelling for change descriptions.
pub(crate) fn type_name(ty: &Type, ast: &Ast) -> String {
    match ty {
        Type::Int8 => "int8".to_owned(),
        Type::Int16 => "int16".to_owned(),
        Type::Int32 => "int32".to_owned(),
        Type::Int64 => "int64".to_owned(),
        Type::UInt8 => "uint8".to_owned(),
        Type::UInt16 => "uint16".to_owned(),
        Type::UInt32 => "uint32".to_owned(),
        Type::UInt64 => "uint64".to_owned(),
        Type::Float => "float".to_owned(),
        Type::Double => "double".to_owned(),
        Type::Bool => "bool".to_owned(),
        Type::String => "string".to_owned(),
        Type::WString => "wstring".to_owned(),
        Type::Blob => "blob".to_owned(),
        Type::MetaName => "bond_meta::name".to_owned(),
        Type::MetaFullName => "bond_meta::full_name".to_owned(),
        Type::List(t) => format!("list<{}>", type_name(t, ast)),
        Type::Vector(t) => format!("vector<{}>", type_name(t, ast)),
        Type::Set(t) => format!("set<{}>", type_name(t, ast)),
        Type::Map(k, v) => format!("map<{}, {}>", type_name(k, ast), type_name(v, ast)),
        Type::Nullable(t) => format!("nullable<{}>", type_name(t, ast)),
        Type::Bonded(t) => format!("bonded<{}>", type_name(t, ast)),
        Type::Maybe(t) => format!("maybe<{}>", type_name(t, ast)),
        Type::Parameter(p) => p.name.clone(),
        Type::IntLiteral(n) => n.to_string(),
        Type::UserDefined { decl, args } => {
            let base = ast.arena.get(*decl).qualified_name();
            if args.is_empty() {
                base
            } else {
                let args: Vec<String> = args.iter().map(|a| type_name(a, ast)).collect();
                format!("{}<{}>", base, args.join(", "))
            }
        }
        Type::Unresolved { name, .. } => name.clone(),
    }
}

/// Classify a field or alias type change per the wire rules. Aliases
/// are flattened first so wire-equivalent alias rewrites compare as the
/// types they stand for.
pub(crate) fn classify_type_change(
    old: &Type,
    old_ast: &Ast,
    new: &Type,
    new_ast: &Ast,
) -> TypeChange {
    let old_flat = flatten_type(old, &old_ast.arena);
    let new_flat = flatten_type(new, &new_ast.arena);

    if type_eq(&old_flat, old_ast, &new_flat, new_ast) {
        return TypeChange::Equal;
    }

    // bonded<T> <-> T carries the same wire payload.
    if let Type::Bonded(inner) = &old_flat {
        if type_eq(inner, old_ast, &new_flat, new_ast) {
            return TypeChange::Compatible {
                recommendation: None,
            };
        }
    }
    if let Type::Bonded(inner) = &new_flat {
        if type_eq(&old_flat, old_ast, inner, new_ast) {
            return TypeChange::Compatible {
                recommendation: None,
            };
        }
    }

    match (&old_flat, &new_flat) {
        // vector and list share an encoding when the elements agree.
        (Type::Vector(a), Type::List(b)) | (Type::List(a), Type::Vector(b))
            if type_eq(a, old_ast, b, new_ast) =>
        {
            TypeChange::Compatible {
                recommendation: None,
            }
        }

        // blob is an int8 sequence on the wire.
        (Type::Blob, Type::Vector(el)) | (Type::Blob, Type::List(el))
            if **el == Type::Int8 =>
        {
            TypeChange::Compatible {
                recommendation: None,
            }
        }
        (Type::Vector(el), Type::Blob) | (Type::List(el), Type::Blob)
            if **el == Type::Int8 =>
        {
            TypeChange::Compatible {
                recommendation: None,
            }
        }

        // 32-bit enums interconvert with int32.
        (Type::Int32, other) if is_enum(other, new_ast) => TypeChange::Compatible {
            recommendation: None,
        },
        (other, Type::Int32) if is_enum(other, old_ast) => TypeChange::Compatible {
            recommendation: None,
        },

        // Narrow ints widen into an enum, one direction only.
        (Type::Int8, other) | (Type::Int16, other) if is_enum(other, new_ast) => {
            TypeChange::Compatible {
                recommendation: Some(
                    "update consumers to the enum before producers start writing it".to_owned(),
                ),
            }
        }

        // Numeric promotions, narrower to wider only.
        (a, b) if widens(a, b) => TypeChange::Compatible {
            recommendation: None,
        },

        _ => TypeChange::Breaking,
    }
}

fn is_enum(ty: &Type, ast: &Ast) -> bool {
    matches!(ty, Type::UserDefined { decl, .. }
        if matches!(ast.arena.get(*decl), Declaration::Enum { .. }))
}

/// One-directional numeric widening table.
fn widens(old: &Type, new: &Type) -> bool {
    matches!(
        (old, new),
        (Type::Float, Type::Double)
            | (Type::UInt8, Type::UInt16)
            | (Type::UInt8, Type::UInt32)
            | (Type::UInt8, Type::UInt64)
            | (Type::UInt16, Type::UInt32)
            | (Type::UInt16, Type::UInt64)
            | (Type::UInt32, Type::UInt64)
            | (Type::Int8, Type::Int16)
            | (Type::Int8, Type::Int32)
            | (Type::Int8, Type::Int64)
            | (Type::Int16, Type::Int32)
            | (Type::Int16, Type::Int64)
            | (Type::Int32, Type::Int64)
    )
}
