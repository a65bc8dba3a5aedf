//! Alias flattening -- recursive substitution of an alias by its aliased
//! type, with generic argument substitution and cycle cutting.
//!
//! Validation flattens before resolution has run, so names may still be
//! `Unresolved`; the compatibility checker flattens fully resolved types
//! where alias references are `UserDefined`. Both walks share this
//! module.

use crate::ast::{DeclArena, DeclId, Declaration, Type};
use crate::pass2_symbols::SymbolTable;
use std::collections::{HashMap, HashSet};

/// Flatten aliases in a resolved type. `UserDefined` references to alias
/// declarations are replaced by their (substituted) aliased types;
/// everything else is rebuilt with flattened children.
pub fn flatten_type(ty: &Type, arena: &DeclArena) -> Type {
    flatten(ty, arena, None, "", &mut HashSet::new())
}

/// Flatten aliases in a not-yet-resolved type, chasing `Unresolved`
/// single-segment names through `file`'s alias scope.
pub(crate) fn flatten_with_symbols(
    ty: &Type,
    file: &str,
    arena: &DeclArena,
    symbols: &SymbolTable,
) -> Type {
    flatten(ty, arena, Some(symbols), file, &mut HashSet::new())
}

fn flatten(
    ty: &Type,
    arena: &DeclArena,
    symbols: Option<&SymbolTable>,
    file: &str,
    visiting: &mut HashSet<DeclId>,
) -> Type {
    match ty {
        Type::Unresolved { name, args } => {
            let flat_args: Vec<Type> = args
                .iter()
                .map(|a| flatten(a, arena, symbols, file, visiting))
                .collect();
            let alias = symbols
                .and_then(|s| s.lookup_alias(file, name))
                .filter(|_| !name.contains('.'));
            match alias {
                Some(id) => expand_alias(id, &flat_args, arena, symbols, visiting)
                    .unwrap_or_else(|| Type::Unresolved {
                        name: name.clone(),
                        args: flat_args,
                    }),
                None => Type::Unresolved {
                    name: name.clone(),
                    args: flat_args,
                },
            }
        }
        Type::UserDefined { decl, args } => {
            let flat_args: Vec<Type> = args
                .iter()
                .map(|a| flatten(a, arena, symbols, file, visiting))
                .collect();
            if matches!(arena.get(*decl), Declaration::Alias { .. }) {
                expand_alias(*decl, &flat_args, arena, symbols, visiting).unwrap_or_else(|| {
                    Type::UserDefined {
                        decl: *decl,
                        args: flat_args,
                    }
                })
            } else {
                Type::UserDefined {
                    decl: *decl,
                    args: flat_args,
                }
            }
        }
        Type::List(t) => Type::List(Box::new(flatten(t, arena, symbols, file, visiting))),
        Type::Vector(t) => Type::Vector(Box::new(flatten(t, arena, symbols, file, visiting))),
        Type::Set(t) => Type::Set(Box::new(flatten(t, arena, symbols, file, visiting))),
        Type::Map(k, v) => Type::Map(
            Box::new(flatten(k, arena, symbols, file, visiting)),
            Box::new(flatten(v, arena, symbols, file, visiting)),
        ),
        Type::Nullable(t) => Type::Nullable(Box::new(flatten(t, arena, symbols, file, visiting))),
        Type::Bonded(t) => Type::Bonded(Box::new(flatten(t, arena, symbols, file, visiting))),
        Type::Maybe(t) => Type::Maybe(Box::new(flatten(t, arena, symbols, file, visiting))),
        other => other.clone(),
    }
}

/// Expand one alias with the given arguments. Returns `None` on a cycle,
/// leaving the reference in place.
fn expand_alias(
    id: DeclId,
    args: &[Type],
    arena: &DeclArena,
    symbols: Option<&SymbolTable>,
    visiting: &mut HashSet<DeclId>,
) -> Option<Type> {
    if !visiting.insert(id) {
        return None;
    }
    let result = match arena.get(id) {
        Declaration::Alias {
            params,
            aliased,
            prov,
            ..
        } => {
            let map: HashMap<&str, &Type> = params
                .iter()
                .map(|p| p.name.as_str())
                .zip(args.iter())
                .collect();
            let substituted = substitute(aliased, &map);
            // Nested alias references were written in the alias's own
            // file; chase them through that file's scope.
            Some(flatten(&substituted, arena, symbols, &prov.file, visiting))
        }
        _ => None,
    };
    visiting.remove(&id);
    result
}

/// Replace generic parameter references by the given actual arguments.
pub fn substitute(ty: &Type, map: &HashMap<&str, &Type>) -> Type {
    match ty {
        Type::Parameter(p) => match map.get(p.name.as_str()) {
            Some(arg) => (*arg).clone(),
            None => ty.clone(),
        },
        Type::List(t) => Type::List(Box::new(substitute(t, map))),
        Type::Vector(t) => Type::Vector(Box::new(substitute(t, map))),
        Type::Set(t) => Type::Set(Box::new(substitute(t, map))),
        Type::Map(k, v) => Type::Map(Box::new(substitute(k, map)), Box::new(substitute(v, map))),
        Type::Nullable(t) => Type::Nullable(Box::new(substitute(t, map))),
        Type::Bonded(t) => Type::Bonded(Box::new(substitute(t, map))),
        Type::Maybe(t) => Type::Maybe(Box::new(substitute(t, map))),
        Type::UserDefined { decl, args } => Type::UserDefined {
            decl: *decl,
            args: args.iter().map(|a| substitute(a, map)).collect(),
        },
        Type::Unresolved { name, args } => Type::Unresolved {
            name: name.clone(),
            args: args.iter().map(|a| substitute(a, map)).collect(),
        },
        other => other.clone(),
    }
}
