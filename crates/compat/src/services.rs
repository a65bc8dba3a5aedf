//! Service diffing: base type, then methods matched by name.

use crate::change::{ChangeCategory, SchemaChange};
use crate::types::type_eq;
use bond_core::{Ast, Declaration, Method, MethodType, Type};
use std::collections::HashMap;

pub(crate) fn diff_services(
    old_decl: &Declaration,
    old_ast: &Ast,
    new_decl: &Declaration,
    new_ast: &Ast,
    out: &mut Vec<SchemaChange>,
) {
    let (old_base, old_methods) = match old_decl {
        Declaration::Service { base, methods, .. } => (base, methods),
        _ => return,
    };
    let (new_base, new_methods) = match new_decl {
        Declaration::Service { base, methods, .. } => (base, methods),
        _ => return,
    };

    let service_name = new_decl.qualified_name();

    if !base_eq(old_base, old_ast, new_base, new_ast) {
        out.push(SchemaChange::new(
            ChangeCategory::BreakingWire,
            format!("base of service '{}' changed", service_name),
            new_decl.prov(),
        ));
    }

    let old_by_name: HashMap<&str, &Method> =
        old_methods.iter().map(|m| (m.name(), m)).collect();
    let new_by_name: HashMap<&str, &Method> =
        new_methods.iter().map(|m| (m.name(), m)).collect();

    for m in old_methods {
        if !new_by_name.contains_key(m.name()) {
            out.push(SchemaChange::new(
                ChangeCategory::BreakingWire,
                format!(
                    "method '{}' removed from service '{}'",
                    m.name(),
                    service_name
                ),
                m.prov(),
            ));
        }
    }

    for m in new_methods {
        match old_by_name.get(m.name()) {
            None => {
                out.push(SchemaChange::new(
                    ChangeCategory::Compatible,
                    format!("method '{}' added to service '{}'", m.name(), service_name),
                    m.prov(),
                ));
            }
            Some(old_m) => {
                if !signature_eq(old_m, old_ast, m, new_ast) {
                    out.push(SchemaChange::new(
                        ChangeCategory::BreakingWire,
                        format!(
                            "signature of method '{}' in service '{}' changed",
                            m.name(),
                            service_name
                        ),
                        m.prov(),
                    ));
                }
            }
        }
    }
}

fn base_eq(old: &Option<Type>, old_ast: &Ast, new: &Option<Type>, new_ast: &Ast) -> bool {
    match (old, new) {
        (None, None) => true,
        (Some(a), Some(b)) => type_eq(a, old_ast, b, new_ast),
        _ => false,
    }
}

fn signature_eq(old: &Method, old_ast: &Ast, new: &Method, new_ast: &Ast) -> bool {
    match (old, new) {
        (
            Method::Function {
                result: or,
                input: oi,
                ..
            },
            Method::Function {
                result: nr,
                input: ni,
                ..
            },
        ) => method_type_eq(or, old_ast, nr, new_ast) && method_type_eq(oi, old_ast, ni, new_ast),
        (Method::Event { input: oi, .. }, Method::Event { input: ni, .. }) => {
            method_type_eq(oi, old_ast, ni, new_ast)
        }
        _ => false,
    }
}

fn method_type_eq(old: &MethodType, old_ast: &Ast, new: &MethodType, new_ast: &Ast) -> bool {
    match (old, new) {
        (MethodType::Void, MethodType::Void) => true,
        (MethodType::Unary(a), MethodType::Unary(b))
        | (MethodType::Streaming(a), MethodType::Streaming(b)) => {
            type_eq(a, old_ast, b, new_ast)
        }
        _ => false,
    }
}
