//! bond-compat: schema compatibility checker.
//!
//! Compares two compiled ASTs of the same logical schema and classifies
//! each structural difference by its effect on the wire: `Compatible`,
//! `BreakingWire` (ordinal-keyed binary encodings), or `BreakingText`
//! (name-keyed text encodings). Both inputs are expected to have
//! resolved cleanly; callers surface parse errors instead of diffing.

mod change;
mod enums;
mod services;
mod structs;
mod types;

pub use change::{format_changes, ChangeCategory, SchemaChange};

use bond_core::{Ast, Declaration};
use std::collections::BTreeMap;

/// Diff two compiled schemas. The result is deterministic for identical
/// inputs; ordering inside the set is not a contract.
pub fn check_compatibility(old: &Ast, new: &Ast) -> Vec<SchemaChange> {
    let old_decls = index_roots(old);
    let new_decls = index_roots(new);
    let mut out = Vec::new();

    for (name, old_decl) in &old_decls {
        if !new_decls.contains_key(name) {
            out.push(SchemaChange::new(
                ChangeCategory::BreakingWire,
                format!("{} '{}' removed", old_decl.kind(), name),
                old_decl.prov(),
            ));
        }
    }

    for (name, new_decl) in &new_decls {
        match old_decls.get(name) {
            None => {
                out.push(SchemaChange::new(
                    ChangeCategory::Compatible,
                    format!("{} '{}' added", new_decl.kind(), name),
                    new_decl.prov(),
                ));
            }
            Some(old_decl) if old_decl.kind() != new_decl.kind() => {
                out.push(SchemaChange::new(
                    ChangeCategory::BreakingWire,
                    format!(
                        "declaration '{}' changed from {} to {}",
                        name,
                        old_decl.kind(),
                        new_decl.kind()
                    ),
                    new_decl.prov(),
                ));
            }
            Some(old_decl) => {
                diff_same_kind(old_decl, old, new_decl, new, &mut out);
            }
        }
    }

    // Deterministic report order; consumers sort or group as they like.
    out.sort_by(|a, b| {
        (&a.location.file, a.location.line, a.location.column, &a.description)
            .cmp(&(&b.location.file, b.location.line, b.location.column, &b.description))
    });
    out
}

fn index_roots(ast: &Ast) -> BTreeMap<String, &Declaration> {
    ast.roots
        .iter()
        .map(|id| {
            let d = ast.arena.get(*id);
            (d.qualified_name(), d)
        })
        .collect()
}

fn diff_same_kind(
    old_decl: &Declaration,
    old_ast: &Ast,
    new_decl: &Declaration,
    new_ast: &Ast,
    out: &mut Vec<SchemaChange>,
) {
    match (old_decl, new_decl) {
        (Declaration::Struct { .. }, Declaration::Struct { .. }) => {
            structs::diff_structs(old_decl, old_ast, new_decl, new_ast, out);
        }
        (Declaration::Enum { .. }, Declaration::Enum { .. }) => {
            enums::diff_enums(old_decl, old_ast, new_decl, new_ast, out);
        }
        (Declaration::Service { .. }, Declaration::Service { .. }) => {
            services::diff_services(old_decl, old_ast, new_decl, new_ast, out);
        }
        (
            Declaration::Alias {
                aliased: old_aliased,
                ..
            },
            Declaration::Alias {
                aliased: new_aliased,
                ..
            },
        ) => {
            diff_alias(old_aliased, old_ast, new_aliased, new_ast, new_decl, out);
        }
        // Forward declarations carry no wire shape of their own.
        (Declaration::Forward { .. }, Declaration::Forward { .. }) => {}
        _ => {}
    }
}

/// Alias rewrites go through the type-change classifier, not naive
/// structural inequality, so wire-equivalent rewrites such as
/// `vector<T>` to `list<T>` do not flag as breaking.
fn diff_alias(
    old_aliased: &bond_core::Type,
    old_ast: &Ast,
    new_aliased: &bond_core::Type,
    new_ast: &Ast,
    new_decl: &Declaration,
    out: &mut Vec<SchemaChange>,
) {
    use crate::types::TypeChange;
    match types::classify_type_change(old_aliased, old_ast, new_aliased, new_ast) {
        TypeChange::Equal => {}
        TypeChange::Compatible { recommendation } => {
            let mut change = SchemaChange::new(
                ChangeCategory::Compatible,
                format!(
                    "aliased type of '{}' changed from {} to {}",
                    new_decl.qualified_name(),
                    types::type_name(old_aliased, old_ast),
                    types::type_name(new_aliased, new_ast)
                ),
                new_decl.prov(),
            );
            if let Some(rec) = recommendation {
                change = change.with_recommendation(rec);
            }
            out.push(change);
        }
        TypeChange::Breaking => {
            out.push(SchemaChange::new(
                ChangeCategory::BreakingWire,
                format!(
                    "aliased type of '{}' changed from {} to {}",
                    new_decl.qualified_name(),
                    types::type_name(old_aliased, old_ast),
                    types::type_name(new_aliased, new_ast)
                ),
                new_decl.prov(),
            ));
        }
    }
}
