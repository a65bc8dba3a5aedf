//! Pass 3: declaration validation -- structural checks on structs,
//! enums, and services after symbol registration, before type
//! resolution.
//!
//! Errors accumulate across declarations so a single run surfaces as
//! many problems as possible, but the first error within a declaration
//! aborts that declaration's validation.

mod field;

use crate::ast::{DeclArena, Declaration, Method, MethodType, Type};
use crate::error::{ErrorKind, ParseError};
use crate::pass2_symbols::SymbolTable;
use std::collections::HashMap;

pub fn validate(arena: &DeclArena, symbols: &SymbolTable) -> Vec<ParseError> {
    let mut errors = Vec::new();
    for (_, decl) in arena.iter() {
        let result = match decl {
            Declaration::Struct { .. } => validate_struct(decl, arena, symbols),
            Declaration::Enum { .. } => validate_enum(decl),
            Declaration::Service { .. } => validate_service(decl, arena, symbols),
            Declaration::Alias { .. } | Declaration::Forward { .. } => Ok(()),
        };
        if let Err(e) = result {
            errors.push(e);
        }
    }
    errors
}

fn validate_struct(
    decl: &Declaration,
    arena: &DeclArena,
    symbols: &SymbolTable,
) -> Result<(), ParseError> {
    let (name, fields) = match decl {
        Declaration::Struct { name, fields, .. } => (name, fields),
        _ => return Ok(()),
    };

    let mut by_ordinal: HashMap<u16, &str> = HashMap::new();
    let mut by_name: HashMap<&str, u16> = HashMap::new();
    for f in fields {
        if let Some(first) = by_ordinal.get(&f.ordinal) {
            return Err(ParseError::semantic(
                ErrorKind::DuplicateOrdinal,
                &f.prov,
                format!(
                    "duplicate ordinal {} in struct '{}': already used by field '{}'",
                    f.ordinal, name, first
                ),
            ));
        }
        by_ordinal.insert(f.ordinal, &f.name);
        if by_name.contains_key(f.name.as_str()) {
            return Err(ParseError::semantic(
                ErrorKind::DuplicateField,
                &f.prov,
                format!("duplicate field '{}' in struct '{}'", f.name, name),
            ));
        }
        by_name.insert(&f.name, f.ordinal);
    }

    for f in fields {
        field::validate_field(f, decl, arena, symbols)?;
    }
    Ok(())
}

fn validate_enum(decl: &Declaration) -> Result<(), ParseError> {
    let (name, constants) = match decl {
        Declaration::Enum {
            name, constants, ..
        } => (name, constants),
        _ => return Ok(()),
    };
    let mut seen: HashMap<&str, ()> = HashMap::new();
    for c in constants {
        if seen.insert(c.name.as_str(), ()).is_some() {
            return Err(ParseError::semantic(
                ErrorKind::DuplicateConstant,
                &c.prov,
                format!("duplicate constant '{}' in enum '{}'", c.name, name),
            ));
        }
    }
    Ok(())
}

fn validate_service(
    decl: &Declaration,
    arena: &DeclArena,
    symbols: &SymbolTable,
) -> Result<(), ParseError> {
    let (name, base, methods) = match decl {
        Declaration::Service {
            name,
            base,
            methods,
            ..
        } => (name, base, methods),
        _ => return Ok(()),
    };

    if let Some(base_ty) = base {
        validate_service_base(name, base_ty, decl, arena, symbols)?;
    }

    let mut seen: HashMap<&str, ()> = HashMap::new();
    for m in methods {
        if seen.insert(m.name(), ()).is_some() {
            return Err(ParseError::semantic(
                ErrorKind::DuplicateMethod,
                m.prov(),
                format!("duplicate method '{}' in service '{}'", m.name(), name),
            ));
        }
        if let Method::Event { name: mname, input, .. } = m {
            if matches!(input, MethodType::Streaming(_)) {
                return Err(ParseError::semantic(
                    ErrorKind::IllegalEventInput,
                    m.prov(),
                    format!("event '{}' cannot have a streaming input", mname),
                ));
            }
        }
    }
    Ok(())
}

/// A service base must name a service: not a struct, not an enum, not a
/// type parameter. An unknown name is left for the resolver to report.
fn validate_service_base(
    service: &str,
    base: &Type,
    decl: &Declaration,
    arena: &DeclArena,
    symbols: &SymbolTable,
) -> Result<(), ParseError> {
    match base {
        Type::Parameter(p) => Err(ParseError::semantic(
            ErrorKind::IllegalInheritance,
            decl.prov(),
            format!(
                "service '{}' cannot inherit from type parameter '{}'",
                service, p.name
            ),
        )),
        Type::Unresolved { name, .. } => {
            match symbols.lookup(name, decl.namespaces(), arena) {
                Some(target) if !matches!(arena.get(target), Declaration::Service { .. }) => {
                    Err(ParseError::semantic(
                        ErrorKind::IllegalInheritance,
                        decl.prov(),
                        format!(
                            "service '{}' cannot inherit from {} '{}'",
                            service,
                            arena.get(target).kind(),
                            name
                        ),
                    ))
                }
                _ => Ok(()),
            }
        }
        _ => Err(ParseError::semantic(
            ErrorKind::IllegalInheritance,
            decl.prov(),
            format!("service '{}' base must be a service", service),
        )),
    }
}
