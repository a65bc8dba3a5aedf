//! Struct diffing: base type, then fields matched by ordinal. Ordinals
//! are the wire identity; names only matter to text protocols.

use crate::change::{ChangeCategory, SchemaChange};
use crate::types::{classify_type_change, type_eq, type_name, TypeChange};
use bond_core::{Ast, Declaration, Field, Modifier, Type};
use std::collections::BTreeMap;

pub(crate) fn diff_structs(
    old_decl: &Declaration,
    old_ast: &Ast,
    new_decl: &Declaration,
    new_ast: &Ast,
    out: &mut Vec<SchemaChange>,
) {
    let (old_base, old_fields) = match old_decl {
        Declaration::Struct { base, fields, .. } => (base, fields),
        _ => return,
    };
    let (new_base, new_fields) = match new_decl {
        Declaration::Struct { base, fields, .. } => (base, fields),
        _ => return,
    };

    if !base_eq(old_base, old_ast, new_base, new_ast) {
        out.push(SchemaChange::new(
            ChangeCategory::BreakingWire,
            format!(
                "Inheritance hierarchy changed for struct '{}'",
                new_decl.qualified_name()
            ),
            new_decl.prov(),
        ));
    }

    let old_by_ordinal: BTreeMap<u16, &Field> =
        old_fields.iter().map(|f| (f.ordinal, f)).collect();
    let new_by_ordinal: BTreeMap<u16, &Field> =
        new_fields.iter().map(|f| (f.ordinal, f)).collect();

    for (ordinal, old_field) in &old_by_ordinal {
        if !new_by_ordinal.contains_key(ordinal) {
            let category = if old_field.modifier == Modifier::Required {
                ChangeCategory::BreakingWire
            } else {
                ChangeCategory::Compatible
            };
            out.push(SchemaChange::new(
                category,
                format!(
                    "{} field '{}' (ordinal {}) removed",
                    old_field.modifier.keyword(),
                    old_field.name,
                    ordinal
                ),
                &old_field.prov,
            ));
        }
    }

    for (ordinal, new_field) in &new_by_ordinal {
        match old_by_ordinal.get(ordinal) {
            None => {
                let category = if new_field.modifier == Modifier::Required {
                    ChangeCategory::BreakingWire
                } else {
                    ChangeCategory::Compatible
                };
                out.push(SchemaChange::new(
                    category,
                    format!(
                        "{} field '{}' (ordinal {}) added",
                        new_field.modifier.keyword(),
                        new_field.name,
                        ordinal
                    ),
                    &new_field.prov,
                ));
            }
            Some(old_field) => {
                diff_matched_field(old_field, old_ast, new_field, new_ast, out);
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

fn diff_matched_field(
    old: &Field,
    old_ast: &Ast,
    new: &Field,
    new_ast: &Ast,
    out: &mut Vec<SchemaChange>,
) {
    if old.name != new.name {
        out.push(SchemaChange::new(
            ChangeCategory::BreakingText,
            format!(
                "field name changed from '{}' to '{}' (ordinal {})",
                old.name, new.name, new.ordinal
            ),
            &new.prov,
        ));
    }

    if old.modifier != new.modifier {
        out.push(classify_modifier_change(old, new));
    }

    match classify_type_change(&old.ty, old_ast, &new.ty, new_ast) {
        TypeChange::Equal => {}
        TypeChange::Compatible { recommendation } => {
            let mut change = SchemaChange::new(
                ChangeCategory::Compatible,
                type_change_description(old, old_ast, new, new_ast),
                &new.prov,
            );
            if let Some(rec) = recommendation {
                change = change.with_recommendation(rec);
            }
            out.push(change);
        }
        TypeChange::Breaking => {
            out.push(SchemaChange::new(
                ChangeCategory::BreakingWire,
                type_change_description(old, old_ast, new, new_ast),
                &new.prov,
            ));
        }
    }

    // Defaults are part of the wire contract for required fields and
    // semantic for readers of omitted optional fields.
    if old.default != new.default {
        out.push(SchemaChange::new(
            ChangeCategory::BreakingWire,
            format!(
                "default value of field '{}' (ordinal {}) changed",
                new.name, new.ordinal
            ),
            &new.prov,
        ));
    }
}

fn type_change_description(old: &Field, old_ast: &Ast, new: &Field, new_ast: &Ast) -> String {
    format!(
        "type of field '{}' (ordinal {}) changed from {} to {}",
        new.name,
        new.ordinal,
        type_name(&old.ty, old_ast),
        type_name(&new.ty, new_ast)
    )
}

/// Modifier transition matrix: a direct optional/required flip breaks
/// the wire; every transition through `required_optional` is the safe
/// two-step path.
fn classify_modifier_change(old: &Field, new: &Field) -> SchemaChange {
    let description = format!(
        "modifier of field '{}' (ordinal {}) changed from {} to {}",
        new.name,
        new.ordinal,
        old.modifier.keyword(),
        new.modifier.keyword()
    );
    match (old.modifier, new.modifier) {
        (Modifier::Optional, Modifier::Required) | (Modifier::Required, Modifier::Optional) => {
            SchemaChange::new(ChangeCategory::BreakingWire, description, &new.prov)
                .with_recommendation(
                    "migrate via required_optional: change to required_optional first, deploy \
                     all readers and writers, then complete the transition",
                )
        }
        _ => SchemaChange::new(ChangeCategory::Compatible, description, &new.prov)
            .with_recommendation(
                "required_optional is the safe intermediate; finish the two-step migration \
                 once all readers and writers are deployed",
            ),
    }
}
