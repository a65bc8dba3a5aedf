//! Enum diffing: constants are matched by name, but the wire key is the
//! effective value, so position changes of implicitly valued constants
//! break binary readers.

use crate::change::{ChangeCategory, SchemaChange};
use bond_core::ast::effective_values;
use bond_core::{Ast, Declaration};
use std::collections::HashMap;

pub(crate) fn diff_enums(
    old_decl: &Declaration,
    _old_ast: &Ast,
    new_decl: &Declaration,
    _new_ast: &Ast,
    out: &mut Vec<SchemaChange>,
) {
    let old_constants = match old_decl {
        Declaration::Enum { constants, .. } => constants,
        _ => return,
    };
    let new_constants = match new_decl {
        Declaration::Enum { constants, .. } => constants,
        _ => return,
    };

    let old_values = effective_values(old_constants);
    let new_values = effective_values(new_constants);

    let old_by_name: HashMap<&str, (usize, i64)> = old_constants
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), (i, old_values[i])))
        .collect();
    let new_names: HashMap<&str, ()> = new_constants
        .iter()
        .map(|c| (c.name.as_str(), ()))
        .collect();

    let enum_name = new_decl.qualified_name();

    for c in old_constants {
        if !new_names.contains_key(c.name.as_str()) {
            out.push(SchemaChange::new(
                ChangeCategory::BreakingWire,
                format!("constant '{}' removed from enum '{}'", c.name, enum_name),
                &c.prov,
            ));
        }
    }

    for (position, c) in new_constants.iter().enumerate() {
        match old_by_name.get(c.name.as_str()) {
            None => {
                // An implicitly valued constant inserted before the old
                // tail shifts every subsequent implicit value.
                if position < old_constants.len() && c.value.is_none() {
                    out.push(SchemaChange::new(
                        ChangeCategory::BreakingWire,
                        format!(
                            "constant '{}' inserted into enum '{}' without an explicit value; \
                             implicit values of subsequent constants shift",
                            c.name, enum_name
                        ),
                        &c.prov,
                    ));
                } else {
                    out.push(SchemaChange::new(
                        ChangeCategory::Compatible,
                        format!("constant '{}' added to enum '{}'", c.name, enum_name),
                        &c.prov,
                    ));
                }
            }
            Some((_, old_value)) => {
                let new_value = new_values[position];
                if *old_value != new_value {
                    out.push(SchemaChange::new(
                        ChangeCategory::BreakingWire,
                        format!(
                            "value of constant '{}' in enum '{}' changed from {} to {}",
                            c.name, enum_name, old_value, new_value
                        ),
                        &c.prov,
                    ));
                }
            }
        }
    }
}
